//! Event type names
//!
//! These are the event names sent in the `event` field of broadcast frames.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Collaboration event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollabEventType {
    /// A user joined the document's room
    UserJoined,
    /// A user left the room (or went offline)
    UserLeft,
    /// A room member's presence status changed
    PresenceChanged,
    /// A field lock was granted
    FieldLocked,
    /// A lock request was refused (conflicting holder)
    FieldLockDenied,
    /// A lock was released by its holder
    FieldUnlocked,
    /// A lock was reclaimed by TTL expiry or holder disconnect
    FieldLockExpired,
    /// A user started composing input
    TypingStarted,
    /// A user stopped composing input (explicit or auto-clear)
    TypingStopped,
    /// Opaque document changes, relayed without interpretation
    DocumentMutated,
}

impl CollabEventType {
    /// Get the wire name of the event type
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UserJoined => "user-joined",
            Self::UserLeft => "user-left",
            Self::PresenceChanged => "presence-changed",
            Self::FieldLocked => "field-locked",
            Self::FieldLockDenied => "field-lock-denied",
            Self::FieldUnlocked => "field-unlocked",
            Self::FieldLockExpired => "field-lock-expired",
            Self::TypingStarted => "typing-started",
            Self::TypingStopped => "typing-stopped",
            Self::DocumentMutated => "document-mutated",
        }
    }

    /// Parse an event type from its wire name
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user-joined" => Some(Self::UserJoined),
            "user-left" => Some(Self::UserLeft),
            "presence-changed" => Some(Self::PresenceChanged),
            "field-locked" => Some(Self::FieldLocked),
            "field-lock-denied" => Some(Self::FieldLockDenied),
            "field-unlocked" => Some(Self::FieldUnlocked),
            "field-lock-expired" => Some(Self::FieldLockExpired),
            "typing-started" => Some(Self::TypingStarted),
            "typing-stopped" => Some(Self::TypingStopped),
            "document-mutated" => Some(Self::DocumentMutated),
            _ => None,
        }
    }
}

impl fmt::Display for CollabEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
