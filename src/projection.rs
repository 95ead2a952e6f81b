//! Visibility projection over the canonical store.
//!
//! A cursor is visible iff its user is a current member and its referenced
//! message id is known. The projector owns the visible cursor map and
//! re-evaluates only the keys dirtied by the last mutation, so the cost of
//! an event scales with the event, not the room. No ordering is assumed
//! between the membership-satisfying and message-satisfying events:
//! whichever arrives last flips visibility on, whichever is retracted first
//! flips it off.

use crate::changes::RoomChange;
use crate::store::CanonicalStore;
use crate::types::{MessageId, UserId};
use std::collections::BTreeMap;
use tracing::trace;

/// Incremental maintainer of the visible cursor map.
///
/// Membership and messages need no projection of their own: membership is
/// authoritative as received and messages are visible once known.
#[derive(Debug, Default)]
pub struct Projector {
    visible: BTreeMap<UserId, MessageId>,
}

impl Projector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-evaluate visibility for exactly the given users and report the
    /// resulting cursor transitions in user order.
    pub fn refresh<'a>(
        &mut self,
        store: &CanonicalStore,
        users: impl IntoIterator<Item = &'a UserId>,
    ) -> Vec<RoomChange> {
        let mut changes = Vec::new();

        for user in users {
            let now = store
                .cursor_of(user)
                .filter(|id| store.contains_message(*id))
                .filter(|_| store.contains_member(user));

            match (self.visible.get(user).copied(), now) {
                (None, Some(message)) => {
                    trace!(user = %user, message = %message, "cursor appeared");
                    self.visible.insert(user.clone(), message);
                    changes.push(RoomChange::CursorAppeared {
                        user: user.clone(),
                        message,
                    });
                }
                (Some(old), Some(new)) if old != new => {
                    trace!(user = %user, message = %new, "cursor moved");
                    self.visible.insert(user.clone(), new);
                    changes.push(RoomChange::CursorChanged {
                        user: user.clone(),
                        message: new,
                    });
                }
                (Some(_), None) => {
                    trace!(user = %user, "cursor disappeared");
                    self.visible.remove(user);
                    changes.push(RoomChange::CursorDisappeared { user: user.clone() });
                }
                _ => {}
            }
        }

        changes
    }

    /// The visible cursor map.
    pub fn visible_cursors(&self) -> &BTreeMap<UserId, MessageId> {
        &self.visible
    }

    pub fn is_visible(&self, user: &UserId) -> bool {
        self.visible.contains_key(user)
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Cursor, Message};

    fn alice() -> UserId {
        UserId::new("alice")
    }

    #[test]
    fn test_cursor_hidden_until_both_references_satisfied() {
        let mut store = CanonicalStore::new();
        let mut projector = Projector::new();

        let dirty = store.upsert_cursor(Cursor::new("lobby", "alice", 3));
        assert!(projector.refresh(&store, &dirty.touched_users).is_empty());

        // Membership alone is not enough.
        let dirty = store.add_member(alice());
        assert!(projector.refresh(&store, &dirty.touched_users).is_empty());

        // The message arriving flips it on.
        let dirty = store.add_message(Message::new(3, "bob", "hi")).unwrap();
        let changes = projector.refresh(&store, &dirty.touched_users);
        assert_eq!(
            changes,
            vec![RoomChange::CursorAppeared {
                user: alice(),
                message: crate::types::MessageId(3),
            }]
        );
        assert!(projector.is_visible(&alice()));
    }

    #[test]
    fn test_membership_loss_retracts_cursor() {
        let mut store = CanonicalStore::new();
        let mut projector = Projector::new();

        store.add_message(Message::new(1, "bob", "hi")).unwrap();
        store.add_member(alice());
        let dirty = store.upsert_cursor(Cursor::new("lobby", "alice", 1));
        projector.refresh(&store, &dirty.touched_users);
        assert!(projector.is_visible(&alice()));

        let dirty = store.remove_member(&alice());
        let changes = projector.refresh(&store, &dirty.touched_users);
        assert_eq!(changes, vec![RoomChange::CursorDisappeared { user: alice() }]);
        assert!(!projector.is_visible(&alice()));
    }

    #[test]
    fn test_visible_cursor_move_reports_change() {
        let mut store = CanonicalStore::new();
        let mut projector = Projector::new();

        store.add_message(Message::new(1, "bob", "one")).unwrap();
        store.add_message(Message::new(2, "bob", "two")).unwrap();
        store.add_member(alice());
        let dirty = store.upsert_cursor(Cursor::new("lobby", "alice", 1));
        projector.refresh(&store, &dirty.touched_users);

        let dirty = store.upsert_cursor(Cursor::new("lobby", "alice", 2));
        let changes = projector.refresh(&store, &dirty.touched_users);
        assert_eq!(
            changes,
            vec![RoomChange::CursorChanged {
                user: alice(),
                message: crate::types::MessageId(2),
            }]
        );
    }

    #[test]
    fn test_move_to_unknown_message_retracts() {
        let mut store = CanonicalStore::new();
        let mut projector = Projector::new();

        store.add_message(Message::new(1, "bob", "one")).unwrap();
        store.add_member(alice());
        let dirty = store.upsert_cursor(Cursor::new("lobby", "alice", 1));
        projector.refresh(&store, &dirty.touched_users);

        // A cursor pointing at a message that never arrives stays hidden
        // indefinitely; there is no deletion signal to say otherwise.
        let dirty = store.upsert_cursor(Cursor::new("lobby", "alice", 99));
        let changes = projector.refresh(&store, &dirty.touched_users);
        assert_eq!(changes, vec![RoomChange::CursorDisappeared { user: alice() }]);
    }

    #[test]
    fn test_refresh_untouched_user_is_noop() {
        let mut store = CanonicalStore::new();
        let mut projector = Projector::new();

        store.add_member(alice());
        let changes = projector.refresh(&store, [&alice()]);
        assert!(changes.is_empty());
    }
}
