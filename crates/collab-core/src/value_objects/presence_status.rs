//! Presence status state machine
//!
//! A user's status decays `Online -> Away -> Offline` through idle time and
//! returns to `Online` on recorded activity. `Busy` is only entered by an
//! explicit call; whether activity clears it is a policy flag owned by the
//! engine.

use serde::{Deserialize, Serialize};

/// User presence status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    /// User is connected and recently active
    Online,
    /// User is connected but idle past the away threshold
    Away,
    /// Do not disturb, set explicitly by the user
    Busy,
    /// No live sessions (terminal until the next explicit online transition)
    Offline,
}

impl Default for PresenceStatus {
    fn default() -> Self {
        Self::Offline
    }
}

impl PresenceStatus {
    /// Check if this status should be visible to other room members
    #[must_use]
    pub fn is_visible(&self) -> bool {
        !matches!(self, Self::Offline)
    }

    /// Whether the status was entered by an explicit user action rather than
    /// idle-time decay
    #[must_use]
    pub fn is_explicit(&self) -> bool {
        matches!(self, Self::Busy)
    }
}

impl std::fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Online => write!(f, "online"),
            Self::Away => write!(f, "away"),
            Self::Busy => write!(f, "busy"),
            Self::Offline => write!(f, "offline"),
        }
    }
}

/// Error when parsing a status from string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid presence status: {0}")]
pub struct StatusParseError(pub String);

impl std::str::FromStr for PresenceStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "online" => Ok(Self::Online),
            "away" => Ok(Self::Away),
            "busy" => Ok(Self::Busy),
            "offline" => Ok(Self::Offline),
            _ => Err(StatusParseError(s.to_string())),
        }
    }
}
