//! Outbound event model
//!
//! Events fanned out to every session in a document's room.

mod event_types;
mod payloads;

pub use event_types::CollabEventType;
pub use payloads::{
    DocumentMutatedPayload, FieldLockDeniedPayload, FieldLockPayload, FieldPayload,
    PresenceChangedPayload, RosterEntry, TypingPayload, UserJoinedPayload, UserLeftPayload,
};

use crate::value_objects::DocumentId;
use serde::{Deserialize, Serialize};

/// An event addressed to one document's room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollabEvent {
    /// Document whose room receives the event
    pub document: DocumentId,
    /// Event type name
    pub event: CollabEventType,
    /// Event-specific payload
    pub data: serde_json::Value,
}

impl CollabEvent {
    /// Build an event from a serializable payload
    pub fn new<P: Serialize>(document: DocumentId, event: CollabEventType, payload: &P) -> Self {
        Self {
            document,
            event,
            data: serde_json::to_value(payload).unwrap_or_default(),
        }
    }
}
