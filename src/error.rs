//! Error types for the room engine.

use crate::types::MessageId;
use thiserror::Error;

/// Main error type for engine operations.
///
/// Both variants are local to a single `apply` call: a rejected event is a
/// no-op and leaves the engine exactly as it was. A cursor referencing an
/// unknown member or message is not an error at all; that gap is handled by
/// visibility projection and resolves whenever the missing event arrives.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    #[error("duplicate message id {0} with conflicting content")]
    DuplicateMessageId(MessageId),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
