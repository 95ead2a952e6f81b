//! # Room State Engine
//!
//! A per-room reconciliation engine that projects a consistent,
//! developer-facing view of a chat room from three independent, unordered
//! backend streams: messages, memberships, and read-cursors.
//!
//! ## Core Concepts
//!
//! - **Canonical store**: raw per-stream knowledge, exactly as delivered
//! - **Initial state**: a full snapshot any stream may send at any time,
//!   atomically replacing prior knowledge for that stream
//! - **Visible model**: the cross-referenced subset exposed to the
//!   developer; a cursor shows only once its user is a member and its
//!   message is known
//! - **Change batch**: the minimal ordered notification one ingested event
//!   produces
//!
//! ## Example
//!
//! ```ignore
//! use roomstate::{MembershipEvent, RoomEngine, RoomId, SubscriptionConfig, UserId};
//!
//! let mut engine = RoomEngine::new(RoomId::new("lobby"));
//! let handle = engine.subscribe(SubscriptionConfig::default());
//!
//! // Feed decoded backend events in arrival order.
//! let batch = engine.apply(MembershipEvent::MemberAdded {
//!     room: RoomId::new("lobby"),
//!     user: UserId::new("alice"),
//! }.into())?;
//!
//! // The snapshot is self-consistent at every point in time.
//! let view = engine.snapshot();
//! ```

pub mod changes;
pub mod engine;
pub mod error;
pub mod events;
pub mod ingest;
pub mod projection;
pub mod store;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use changes::{ChangeBatch, RoomChange};
pub use engine::RoomEngine;
pub use error::{EngineError, Result};
pub use events::{CursorEvent, MembershipEvent, MessageEvent, RoomEvent};
pub use ingest::{CursorIngestor, MembershipIngestor, MessageIngestor, StreamIngestor};
pub use projection::Projector;
pub use store::{CanonicalStore, Dirty};
pub use subscriptions::{
    DropReason, SubscriberEvent, SubscriptionConfig, SubscriptionHandle, SubscriptionId,
    SubscriptionManager,
};
pub use types::*;
