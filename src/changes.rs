//! Change records and per-event notification batches.

use crate::store::{CanonicalStore, Dirty};
use crate::types::{Message, MessageId, Sequence, UserId};
use serde::{Deserialize, Serialize};

/// One observable difference between the visible model before and after an
/// ingested event.
///
/// There is deliberately no message-disappeared variant: the backend never
/// retracts messages, and on a full history resync an id that vanishes only
/// manifests as the disappearance of cursors referencing it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomChange {
    MemberAppeared { user: UserId },

    MemberDisappeared { user: UserId },

    MessageAppeared { message: Message },

    CursorAppeared { user: UserId, message: MessageId },

    /// Same user, new message id, cursor visible throughout.
    CursorChanged { user: UserId, message: MessageId },

    CursorDisappeared { user: UserId },
}

/// All changes produced by one ingested event.
///
/// Records are ordered memberships first, then messages, then cursors, so a
/// consumer applying them left to right never sees a dangling reference.
/// Within a category, records are in key order, which makes batches
/// deterministic. One batch per event: never split, never merged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeBatch {
    /// Ordinal of the `apply` call that produced this batch.
    pub sequence: Sequence,

    pub changes: Vec<RoomChange>,
}

impl ChangeBatch {
    /// Assemble the ordered batch for one ingested event from the dirty key
    /// set and the cursor transitions reported by the projector.
    pub(crate) fn assemble(
        sequence: Sequence,
        store: &CanonicalStore,
        dirty: &Dirty,
        cursor_changes: Vec<RoomChange>,
    ) -> Self {
        let mut changes = Vec::with_capacity(
            dirty.members_added.len()
                + dirty.members_removed.len()
                + dirty.messages_appeared.len()
                + cursor_changes.len(),
        );

        for user in &dirty.members_added {
            changes.push(RoomChange::MemberAppeared { user: user.clone() });
        }
        for user in &dirty.members_removed {
            changes.push(RoomChange::MemberDisappeared { user: user.clone() });
        }
        for id in &dirty.messages_appeared {
            if let Some(message) = store.message(*id) {
                changes.push(RoomChange::MessageAppeared {
                    message: message.clone(),
                });
            }
        }
        changes.extend(cursor_changes);

        Self { sequence, changes }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }
}
