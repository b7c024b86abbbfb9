//! Handler error types

use crate::auth::AuthError;
use crate::protocol::CloseCode;
use collab_core::CollabError;
use thiserror::Error;

/// Errors raised while handling a client request
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Request payload could not be used
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Token validation failed
    #[error("authentication failed: {0}")]
    AuthenticationFailed(#[from] AuthError),

    /// Request requires an authenticated connection
    #[error("not authenticated")]
    NotAuthenticated,

    /// Connection already carries an identity
    #[error("already authenticated")]
    AlreadyAuthenticated,

    /// Engine refused the operation
    #[error(transparent)]
    Engine(#[from] CollabError),
}

impl HandlerError {
    /// Machine-readable code for the `rejected` frame
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPayload(_) => "INVALID_PAYLOAD",
            Self::AuthenticationFailed(_) => "AUTH_FAILED",
            Self::NotAuthenticated => "AUTH_REQUIRED",
            Self::AlreadyAuthenticated => "ALREADY_AUTHENTICATED",
            Self::Engine(e) => e.code(),
        }
    }

    /// Close code when the error terminates the connection
    ///
    /// Only failed authentication is fatal; everything else is answered
    /// with a `rejected` frame and the connection stays open.
    #[must_use]
    pub fn close_code(&self) -> Option<CloseCode> {
        match self {
            Self::AuthenticationFailed(_) => Some(CloseCode::AuthenticationFailed),
            _ => None,
        }
    }
}

/// Handler result type
pub type HandlerResult<T> = Result<T, HandlerError>;
