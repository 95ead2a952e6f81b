//! Stream ingestors: one per backend stream.
//!
//! An ingestor translates each event variant into exactly one canonical
//! store operation and reports the dirtied keys. Validation runs before any
//! mutation, so a rejected event is a strict no-op. Cross-stream visibility
//! is the projector's concern and never checked here.

use crate::error::{EngineError, Result};
use crate::events::{CursorEvent, MembershipEvent, MessageEvent};
use crate::store::{CanonicalStore, Dirty};
use crate::types::{Message, MessageId, RoomId, UserId};
use std::collections::BTreeMap;

/// Capability set shared by the three stream ingestors.
pub trait StreamIngestor {
    type Event;

    /// Reject structurally invalid events. Must not touch the store.
    fn validate(&self, room: &RoomId, event: &Self::Event) -> Result<()>;

    /// True for full-snapshot events that atomically replace stream state.
    fn is_initial_state(&self, event: &Self::Event) -> bool;

    /// Apply a validated event to the store.
    fn ingest(&self, store: &mut CanonicalStore, event: Self::Event) -> Result<Dirty>;
}

fn validate_user(user: &UserId) -> Result<()> {
    if user.0.trim().is_empty() {
        return Err(EngineError::MalformedEvent("blank user id".into()));
    }
    Ok(())
}

fn validate_room(engine: &RoomId, event: &RoomId) -> Result<()> {
    if engine != event {
        return Err(EngineError::MalformedEvent(format!(
            "event for room {event} routed to engine for room {engine}"
        )));
    }
    Ok(())
}

/// Ingestor for the message stream.
pub struct MessageIngestor;

impl StreamIngestor for MessageIngestor {
    type Event = MessageEvent;

    fn validate(&self, _room: &RoomId, event: &MessageEvent) -> Result<()> {
        match event {
            MessageEvent::InitialState { messages } => {
                let mut seen: BTreeMap<MessageId, &Message> = BTreeMap::new();
                for message in messages {
                    validate_user(&message.sender)?;
                    if let Some(previous) = seen.insert(message.id, message) {
                        if previous != message {
                            return Err(EngineError::MalformedEvent(format!(
                                "initial state repeats message id {} with different content",
                                message.id
                            )));
                        }
                    }
                }
                Ok(())
            }
            MessageEvent::New { message } => validate_user(&message.sender),
        }
    }

    fn is_initial_state(&self, event: &MessageEvent) -> bool {
        matches!(event, MessageEvent::InitialState { .. })
    }

    fn ingest(&self, store: &mut CanonicalStore, event: MessageEvent) -> Result<Dirty> {
        match event {
            MessageEvent::InitialState { messages } => Ok(store.replace_messages(messages)),
            MessageEvent::New { message } => store.add_message(message),
        }
    }
}

/// Ingestor for the membership stream.
pub struct MembershipIngestor;

impl StreamIngestor for MembershipIngestor {
    type Event = MembershipEvent;

    fn validate(&self, room: &RoomId, event: &MembershipEvent) -> Result<()> {
        match event {
            MembershipEvent::InitialState { room: event_room, users } => {
                validate_room(room, event_room)?;
                users.iter().try_for_each(validate_user)
            }
            MembershipEvent::MemberAdded { room: event_room, user }
            | MembershipEvent::MemberRemoved { room: event_room, user } => {
                validate_room(room, event_room)?;
                validate_user(user)
            }
        }
    }

    fn is_initial_state(&self, event: &MembershipEvent) -> bool {
        matches!(event, MembershipEvent::InitialState { .. })
    }

    fn ingest(&self, store: &mut CanonicalStore, event: MembershipEvent) -> Result<Dirty> {
        match event {
            MembershipEvent::InitialState { users, .. } => Ok(store.replace_membership(users)),
            MembershipEvent::MemberAdded { user, .. } => Ok(store.add_member(user)),
            MembershipEvent::MemberRemoved { user, .. } => Ok(store.remove_member(&user)),
        }
    }
}

/// Ingestor for the cursor stream.
pub struct CursorIngestor;

impl StreamIngestor for CursorIngestor {
    type Event = CursorEvent;

    fn validate(&self, room: &RoomId, event: &CursorEvent) -> Result<()> {
        match event {
            CursorEvent::InitialState { cursors } => {
                let mut seen: BTreeMap<&UserId, MessageId> = BTreeMap::new();
                for cursor in cursors {
                    validate_room(room, &cursor.room)?;
                    validate_user(&cursor.user)?;
                    if let Some(previous) = seen.insert(&cursor.user, cursor.message) {
                        if previous != cursor.message {
                            return Err(EngineError::MalformedEvent(format!(
                                "initial state repeats cursor for user {} with different targets",
                                cursor.user
                            )));
                        }
                    }
                }
                Ok(())
            }
            CursorEvent::Update { cursor } => {
                validate_room(room, &cursor.room)?;
                validate_user(&cursor.user)
            }
        }
    }

    fn is_initial_state(&self, event: &CursorEvent) -> bool {
        matches!(event, CursorEvent::InitialState { .. })
    }

    fn ingest(&self, store: &mut CanonicalStore, event: CursorEvent) -> Result<Dirty> {
        match event {
            CursorEvent::InitialState { cursors } => Ok(store.replace_cursors(cursors)),
            CursorEvent::Update { cursor } => Ok(store.upsert_cursor(cursor)),
        }
    }
}
