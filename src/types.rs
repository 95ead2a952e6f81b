//! Core types for the room engine.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Identifier of the room an engine instance serves.
///
/// Events for other rooms are routing mistakes and rejected at the ingestor
/// boundary; inside one engine the room id is otherwise redundant.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        RoomId(id.into())
    }
}

impl fmt::Debug for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RoomId({})", self.0)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a user, as assigned by the backend.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        UserId(id.into())
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a message.
///
/// Ids are strictly increasing in creation order, so numeric order defines
/// room order, but they may be *received* out of order and with gaps that
/// are filled later.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u64);

impl fmt::Debug for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageId({})", self.0)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordinal of one ingested event, stamped on its change batch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Sequence(pub u64);

impl Sequence {
    pub fn next(self) -> Self {
        Sequence(self.0 + 1)
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seq({})", self.0)
    }
}

/// A single chat message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique per room; numeric order is room order.
    pub id: MessageId,

    /// Who sent it. The sender may have left the room since; the message
    /// stays visible regardless.
    pub sender: UserId,

    /// Message body.
    pub text: String,
}

impl Message {
    pub fn new(id: u64, sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: MessageId(id),
            sender: UserId::new(sender),
            text: text.into(),
        }
    }
}

/// A read-cursor: the newest message a user has read in a room.
///
/// At most one per user per room. Updates carry no sequence number of their
/// own, so newer arrivals simply replace older ones.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub room: RoomId,
    pub user: UserId,
    pub message: MessageId,
}

impl Cursor {
    pub fn new(room: impl Into<String>, user: impl Into<String>, message: u64) -> Self {
        Self {
            room: RoomId::new(room),
            user: UserId::new(user),
            message: MessageId(message),
        }
    }
}

/// The full visible model at one instant.
///
/// Self-consistent by construction: every cursor's user is in `members` and
/// every cursor's message id is in `messages`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub room: RoomId,

    /// Current members, exactly as delivered by the membership stream.
    pub members: BTreeSet<UserId>,

    /// All known messages in id order.
    pub messages: Vec<Message>,

    /// Visible cursors only.
    pub cursors: BTreeMap<UserId, MessageId>,
}

/// Engine counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoomStats {
    /// Known messages.
    pub message_count: usize,
    /// Raw membership set size.
    pub member_count: usize,
    /// Raw cursor map size (visible or not).
    pub cursor_count: usize,
    /// Cursors currently passing visibility.
    pub visible_cursor_count: usize,
    /// Live subscriptions.
    pub subscriber_count: usize,
    /// Events successfully applied.
    pub applied_events: u64,
    /// Non-empty batches broadcast to subscribers.
    pub batches_emitted: u64,
}
