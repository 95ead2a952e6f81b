//! Subscription system for live change delivery.
//!
//! In-process observers of the engine: each `apply` that changes the
//! visible model broadcasts exactly one batch to every subscriber.
//! Buffers are bounded and slow subscribers are dropped rather than ever
//! blocking `apply`. A new subscriber receives only future batches; call
//! `snapshot()` first to populate initial state.
//!
//! # Example
//!
//! ```ignore
//! let handle = engine.subscribe(SubscriptionConfig::default());
//!
//! loop {
//!     match handle.recv() {
//!         Ok(SubscriberEvent::Changes(batch)) => println!("{:?}", batch.changes),
//!         Ok(SubscriberEvent::Dropped { .. }) | Err(_) => break,
//!     }
//! }
//! ```

mod manager;
mod types;

pub use manager::SubscriptionManager;
pub use types::{
    DropReason, SubscriberEvent, SubscriptionConfig, SubscriptionHandle, SubscriptionId,
};
