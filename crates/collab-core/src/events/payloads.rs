//! Event payload structures

use crate::value_objects::{FieldName, PresenceStatus, UserId, UserProfile};
use serde::{Deserialize, Serialize};

/// Payload for `user-joined`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserJoinedPayload {
    pub user_id: UserId,
    pub profile: UserProfile,
}

/// Payload for `user-left`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserLeftPayload {
    pub user_id: UserId,
}

/// Payload for `presence-changed`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceChangedPayload {
    pub user_id: UserId,
    pub status: PresenceStatus,
}

/// Payload for `field-locked`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldLockPayload {
    pub field: FieldName,
    pub user_id: UserId,
}

/// Payload for `field-lock-denied`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldLockDeniedPayload {
    pub field: FieldName,
    pub holder: UserId,
}

/// Payload for `field-unlocked` and `field-lock-expired`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldPayload {
    pub field: FieldName,
}

/// Payload for `typing-started` and `typing-stopped`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypingPayload {
    pub user_id: UserId,
}

/// Payload for `document-mutated`
///
/// `changes` is opaque to this subsystem; the document service is the system
/// of record for content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMutatedPayload {
    pub changes: serde_json::Value,
    pub author_user_id: UserId,
}

/// One member in a join-response roster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    pub user_id: UserId,
    pub profile: UserProfile,
    pub status: PresenceStatus,
}
