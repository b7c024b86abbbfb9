//! Server message frames

use collab_core::{CollabEvent, CollabEventType, DocumentId};
use serde::Serialize;
use serde_json::Value;

/// A frame sent by the server
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// A request succeeded
    Ack {
        request: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
    },

    /// A request failed; `code` is machine-readable
    Rejected {
        request: String,
        code: String,
        message: String,
    },

    /// A room event, sequenced per connection
    Event {
        document: DocumentId,
        event: CollabEventType,
        seq: u64,
        data: Value,
    },
}

impl ServerMessage {
    /// Ack with no payload
    #[must_use]
    pub fn ack(request: &str) -> Self {
        Self::Ack {
            request: request.to_string(),
            data: None,
        }
    }

    /// Ack carrying a payload
    pub fn ack_with<P: Serialize>(request: &str, payload: &P) -> Self {
        Self::Ack {
            request: request.to_string(),
            data: Some(serde_json::to_value(payload).unwrap_or_default()),
        }
    }

    /// Rejection with a code and a human-readable message
    #[must_use]
    pub fn rejected(request: &str, code: &str, message: impl Into<String>) -> Self {
        Self::Rejected {
            request: request.to_string(),
            code: code.to_string(),
            message: message.into(),
        }
    }

    /// Wrap an engine event with this connection's next sequence number
    #[must_use]
    pub fn event(event: CollabEvent, seq: u64) -> Self {
        Self::Event {
            document: event.document,
            event: event.event,
            seq,
            data: event.data,
        }
    }

    /// Serialize to a JSON text frame
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
