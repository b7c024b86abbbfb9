//! Collaboration error types
//!
//! Every error is returned synchronously to the requesting session as a
//! typed rejection; a failed request never corrupts another session's state.
//! Releasing a lock you do not hold is deliberately NOT an error; it is a
//! benign no-op at the lock manager level.

use crate::value_objects::{DocumentId, FieldName, UserId};

/// Errors surfaced to clients by the collaboration engine
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollabError {
    /// The request requires an authenticated session
    #[error("authentication required")]
    AuthRequired,

    /// The action requires a prior join of the document
    #[error("not a member of document {0}")]
    NotInRoom(DocumentId),

    /// A conflicting exclusive lock exists on the field
    #[error("field '{field}' is locked by user {holder}")]
    LockHeld { field: FieldName, holder: UserId },

    /// Shared state cannot be consulted reliably; refuse rather than guess
    #[error("collaboration state unavailable")]
    ServiceUnavailable,
}

impl CollabError {
    /// Stable error code for client-facing rejections
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::AuthRequired => "AUTH_REQUIRED",
            Self::NotInRoom(_) => "NOT_IN_ROOM",
            Self::LockHeld { .. } => "LOCK_HELD",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }

    /// Check if the client can retry after corrective action (join, wait)
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NotInRoom(_) | Self::LockHeld { .. })
    }
}

/// Result type alias for engine operations
pub type CollabResult<T> = Result<T, CollabError>;
