//! The developer-facing engine facade.
//!
//! One `RoomEngine` instance serves one room. All mutation goes through
//! sequential `apply` calls; each call is synchronous and atomic, and no
//! event counts as applied until its change notifications have been
//! computed. Multi-room use is N independent instances fed by an external
//! router.

use crate::changes::ChangeBatch;
use crate::error::Result;
use crate::events::RoomEvent;
use crate::ingest::{CursorIngestor, MembershipIngestor, MessageIngestor, StreamIngestor};
use crate::projection::Projector;
use crate::store::{CanonicalStore, Dirty};
use crate::subscriptions::{
    SubscriptionConfig, SubscriptionHandle, SubscriptionId, SubscriptionManager,
};
use crate::types::{RoomId, RoomSnapshot, RoomStats, Sequence};
use tracing::debug;

/// Validate-then-ingest one stream event.
fn run<I: StreamIngestor>(
    ingestor: I,
    room: &RoomId,
    store: &mut CanonicalStore,
    event: I::Event,
) -> Result<Dirty> {
    ingestor.validate(room, &event)?;
    if ingestor.is_initial_state(&event) {
        debug!(room = %room, "applying initial-state replacement");
    }
    ingestor.ingest(store, event)
}

/// Reconciliation engine for a single room.
///
/// Not internally thread-safe by design: `apply` takes `&mut self`, so the
/// type system enforces the external serialization the event model
/// requires. Subscription handles may live on other threads; delivery to
/// them never blocks `apply`.
pub struct RoomEngine {
    /// Room this instance serves.
    room: RoomId,

    /// Raw per-stream state.
    store: CanonicalStore,

    /// Visible cursor map, maintained incrementally.
    projector: Projector,

    /// Change observers.
    subscriptions: SubscriptionManager,

    /// Ordinal of the last applied event.
    sequence: Sequence,

    /// Non-empty batches broadcast so far.
    batches_emitted: u64,
}

impl RoomEngine {
    /// Create an engine for one room.
    pub fn new(room: RoomId) -> Self {
        Self {
            room,
            store: CanonicalStore::new(),
            projector: Projector::new(),
            subscriptions: SubscriptionManager::new(),
            sequence: Sequence::default(),
            batches_emitted: 0,
        }
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    /// Ingest one backend event and return the batch of visible changes it
    /// caused.
    ///
    /// The batch is also broadcast to subscribers, unless empty. A rejected
    /// event (`MalformedEvent`, `DuplicateMessageId`) is a strict no-op.
    pub fn apply(&mut self, event: RoomEvent) -> Result<ChangeBatch> {
        let dirty = match event {
            RoomEvent::Messages(event) => {
                run(MessageIngestor, &self.room, &mut self.store, event)?
            }
            RoomEvent::Memberships(event) => {
                run(MembershipIngestor, &self.room, &mut self.store, event)?
            }
            RoomEvent::Cursors(event) => {
                run(CursorIngestor, &self.room, &mut self.store, event)?
            }
        };

        let cursor_changes = self.projector.refresh(&self.store, &dirty.touched_users);

        self.sequence = self.sequence.next();
        let batch = ChangeBatch::assemble(self.sequence, &self.store, &dirty, cursor_changes);

        if !batch.is_empty() {
            debug!(
                room = %self.room,
                sequence = batch.sequence.0,
                changes = batch.len(),
                "emitting change batch"
            );
            self.batches_emitted += 1;
            self.subscriptions.broadcast(&batch);
        }

        Ok(batch)
    }

    /// The full current visible model, self-consistent at the instant of
    /// the call. Intended for initial UI population.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            room: self.room.clone(),
            members: self.store.members().clone(),
            messages: self.store.messages_in_order().cloned().collect(),
            cursors: self.projector.visible_cursors().clone(),
        }
    }

    /// Register a change observer. The handle receives only batches from
    /// events applied after this call; call `snapshot()` first for initial
    /// population.
    pub fn subscribe(&self, config: SubscriptionConfig) -> SubscriptionHandle {
        self.subscriptions.subscribe(config)
    }

    /// Deregister a change observer.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscriptions.unsubscribe(id);
    }

    /// Engine counters.
    pub fn stats(&self) -> RoomStats {
        RoomStats {
            message_count: self.store.message_count(),
            member_count: self.store.member_count(),
            cursor_count: self.store.cursor_count(),
            visible_cursor_count: self.projector.visible_count(),
            subscriber_count: self.subscriptions.subscription_count(),
            applied_events: self.sequence.0,
            batches_emitted: self.batches_emitted,
        }
    }
}
