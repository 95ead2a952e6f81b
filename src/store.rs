//! Canonical store: raw per-stream state, exactly as delivered.
//!
//! Each stream's knowledge is held independently with no cross-referencing;
//! whether a cursor "makes sense" against membership or history is decided
//! by projection, never here. Every mutation reports the precise set of
//! affected keys so the projector need not rescan unaffected entities.

use crate::error::{EngineError, Result};
use crate::types::{Cursor, Message, MessageId, UserId};
use std::collections::{BTreeMap, BTreeSet};

/// Keys whose visibility must be re-evaluated after a mutation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dirty {
    /// Users that just entered the raw membership set (sorted).
    pub members_added: Vec<UserId>,

    /// Users that just left the raw membership set (sorted).
    pub members_removed: Vec<UserId>,

    /// Message ids that became known (sorted).
    pub messages_appeared: Vec<MessageId>,

    /// Users whose cursor visibility may have flipped.
    pub touched_users: BTreeSet<UserId>,
}

impl Dirty {
    pub fn is_empty(&self) -> bool {
        self.members_added.is_empty()
            && self.members_removed.is_empty()
            && self.messages_appeared.is_empty()
            && self.touched_users.is_empty()
    }
}

/// Source-of-truth holder for the three streams.
#[derive(Debug, Default)]
pub struct CanonicalStore {
    /// Known messages, keyed (and therefore ordered) by id.
    messages: BTreeMap<MessageId, Message>,

    /// Current membership set.
    members: BTreeSet<UserId>,

    /// Raw cursor map, at most one entry per user.
    cursors: BTreeMap<UserId, MessageId>,

    /// Reverse index: message id -> users whose cursor references it.
    /// Lets a message arrival touch exactly the cursors pointing at it.
    referenced_by: BTreeMap<MessageId, BTreeSet<UserId>>,
}

impl CanonicalStore {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Messages ---

    /// Atomically replace the full message set.
    ///
    /// The described protocol only snapshots messages once at stream start,
    /// but replacement is supported at any time for resilience to a full
    /// resync. Conflicting duplicate ids in `messages` must have been
    /// rejected by validation; later entries win here.
    pub fn replace_messages(&mut self, messages: Vec<Message>) -> Dirty {
        let mut incoming: BTreeMap<MessageId, Message> = BTreeMap::new();
        for message in messages {
            incoming.insert(message.id, message);
        }

        let mut dirty = Dirty::default();
        // Ids that appear or vanish can flip visibility for cursors that
        // reference them. Content changes under a kept id cannot.
        let mut affected: BTreeSet<MessageId> = BTreeSet::new();
        for id in incoming.keys() {
            if !self.messages.contains_key(id) {
                dirty.messages_appeared.push(*id);
                affected.insert(*id);
            }
        }
        for id in self.messages.keys() {
            if !incoming.contains_key(id) {
                affected.insert(*id);
            }
        }

        self.messages = incoming;

        for id in &affected {
            if let Some(users) = self.referenced_by.get(id) {
                dirty.touched_users.extend(users.iter().cloned());
            }
        }
        dirty
    }

    /// Insert one message.
    ///
    /// Redelivery of an identical message is a no-op; the same id with
    /// different content is rejected and the original wins.
    pub fn add_message(&mut self, message: Message) -> Result<Dirty> {
        match self.messages.get(&message.id) {
            Some(existing) if *existing == message => Ok(Dirty::default()),
            Some(_) => Err(EngineError::DuplicateMessageId(message.id)),
            None => {
                let mut dirty = Dirty::default();
                dirty.messages_appeared.push(message.id);
                if let Some(users) = self.referenced_by.get(&message.id) {
                    dirty.touched_users.extend(users.iter().cloned());
                }
                self.messages.insert(message.id, message);
                Ok(dirty)
            }
        }
    }

    // --- Membership ---

    /// Atomically replace the membership set, reporting the symmetric
    /// difference.
    pub fn replace_membership(&mut self, users: BTreeSet<UserId>) -> Dirty {
        let mut dirty = Dirty::default();
        dirty.members_added = users.difference(&self.members).cloned().collect();
        dirty.members_removed = self.members.difference(&users).cloned().collect();
        dirty.touched_users.extend(dirty.members_added.iter().cloned());
        dirty.touched_users.extend(dirty.members_removed.iter().cloned());
        self.members = users;
        dirty
    }

    /// Insert one member. Adding a present member is a no-op, not an error:
    /// streams may redeliver.
    pub fn add_member(&mut self, user: UserId) -> Dirty {
        let mut dirty = Dirty::default();
        if self.members.insert(user.clone()) {
            dirty.touched_users.insert(user.clone());
            dirty.members_added.push(user);
        }
        dirty
    }

    /// Remove one member. Removing an absent member is a no-op.
    pub fn remove_member(&mut self, user: &UserId) -> Dirty {
        let mut dirty = Dirty::default();
        if self.members.remove(user) {
            dirty.touched_users.insert(user.clone());
            dirty.members_removed.push(user.clone());
        }
        dirty
    }

    // --- Cursors ---

    /// Atomically replace the cursor map, reporting every user whose cursor
    /// was added, removed, or moved.
    pub fn replace_cursors(&mut self, cursors: Vec<Cursor>) -> Dirty {
        let mut incoming: BTreeMap<UserId, MessageId> = BTreeMap::new();
        for cursor in cursors {
            incoming.insert(cursor.user, cursor.message);
        }

        let mut dirty = Dirty::default();
        for (user, message) in &self.cursors {
            if incoming.get(user) != Some(message) {
                dirty.touched_users.insert(user.clone());
            }
        }
        for (user, message) in &incoming {
            if self.cursors.get(user) != Some(message) {
                dirty.touched_users.insert(user.clone());
            }
        }

        self.cursors = incoming;
        self.rebuild_reference_index();
        dirty
    }

    /// Last-write-wins replace of one user's cursor. No-op if identical.
    pub fn upsert_cursor(&mut self, cursor: Cursor) -> Dirty {
        let Cursor { user, message, .. } = cursor;

        let mut dirty = Dirty::default();
        if self.cursors.get(&user) == Some(&message) {
            return dirty;
        }

        if let Some(old) = self.cursors.insert(user.clone(), message) {
            self.unreference(old, &user);
        }
        self.referenced_by
            .entry(message)
            .or_default()
            .insert(user.clone());

        dirty.touched_users.insert(user);
        dirty
    }

    fn unreference(&mut self, message: MessageId, user: &UserId) {
        if let Some(users) = self.referenced_by.get_mut(&message) {
            users.remove(user);
            if users.is_empty() {
                self.referenced_by.remove(&message);
            }
        }
    }

    fn rebuild_reference_index(&mut self) {
        self.referenced_by.clear();
        for (user, message) in &self.cursors {
            self.referenced_by
                .entry(*message)
                .or_default()
                .insert(user.clone());
        }
    }

    // --- Reads ---

    pub fn contains_member(&self, user: &UserId) -> bool {
        self.members.contains(user)
    }

    pub fn contains_message(&self, id: MessageId) -> bool {
        self.messages.contains_key(&id)
    }

    pub fn message(&self, id: MessageId) -> Option<&Message> {
        self.messages.get(&id)
    }

    pub fn cursor_of(&self, user: &UserId) -> Option<MessageId> {
        self.cursors.get(user).copied()
    }

    pub fn members(&self) -> &BTreeSet<UserId> {
        &self.members
    }

    /// All known messages in id order.
    pub fn messages_in_order(&self) -> impl Iterator<Item = &Message> {
        self.messages.values()
    }

    /// The raw cursor map, visible or not.
    pub fn cursors(&self) -> &BTreeMap<UserId, MessageId> {
        &self.cursors
    }

    /// Users whose cursor references the given message id.
    pub fn users_referencing(&self, id: MessageId) -> impl Iterator<Item = &UserId> {
        self.referenced_by.get(&id).into_iter().flatten()
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn cursor_count(&self) -> usize {
        self.cursors.len()
    }
}
