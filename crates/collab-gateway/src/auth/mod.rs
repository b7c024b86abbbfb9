//! Connection authentication
//!
//! Tokens are minted by the main application; the gateway only validates
//! them and extracts the identity they carry.

mod jwt;

pub use jwt::{Claims, JwtAuth};

use collab_core::{UserId, UserProfile};
use thiserror::Error;

/// Identity extracted from a validated token
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: UserId,
    pub profile: UserProfile,
}

/// Token validation errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token expired")]
    TokenExpired,

    #[error("invalid token")]
    InvalidToken,
}

/// Validates client tokens into identities
pub trait AuthService: Send + Sync {
    /// Validate a token and return the identity it asserts
    fn authenticate(&self, token: &str) -> Result<Identity, AuthError>;
}
