//! Inbound event unions, one per backend stream.
//!
//! The three streams are independent, unordered relative to each other, and
//! each may deliver a full `InitialState` snapshot at any time, not just at
//! connection start. The enums are serde-tagged so a transport collaborator
//! can decode wire payloads straight into them.

use crate::types::{Cursor, Message, RoomId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Events on the message stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageEvent {
    /// Full history snapshot; atomically replaces everything previously
    /// known about messages.
    InitialState { messages: Vec<Message> },

    /// One newly created message. May arrive out of id order and may fill a
    /// gap below ids already seen.
    New { message: Message },
}

/// Events on the membership stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MembershipEvent {
    /// Full membership snapshot; atomically replaces the membership set.
    InitialState { room: RoomId, users: BTreeSet<UserId> },

    MemberAdded { room: RoomId, user: UserId },

    MemberRemoved { room: RoomId, user: UserId },
}

/// Events on the cursor stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CursorEvent {
    /// Full cursor snapshot; atomically replaces the cursor map.
    InitialState { cursors: Vec<Cursor> },

    /// Last-write-wins update for one user's cursor.
    Update { cursor: Cursor },
}

/// Routing wrapper over the three stream unions.
///
/// The external collaborator funnels all three streams into one sequential
/// queue of these before calling `apply`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stream", rename_all = "snake_case")]
pub enum RoomEvent {
    Messages(MessageEvent),
    Memberships(MembershipEvent),
    Cursors(CursorEvent),
}

impl From<MessageEvent> for RoomEvent {
    fn from(event: MessageEvent) -> Self {
        RoomEvent::Messages(event)
    }
}

impl From<MembershipEvent> for RoomEvent {
    fn from(event: MembershipEvent) -> Self {
        RoomEvent::Memberships(event)
    }
}

impl From<CursorEvent> for RoomEvent {
    fn from(event: CursorEvent) -> Self {
        RoomEvent::Cursors(event)
    }
}
