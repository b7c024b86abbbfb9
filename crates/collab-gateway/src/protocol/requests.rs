//! Client request frames

use collab_core::{DocumentId, FieldName, PresenceStatus};
use serde::Deserialize;
use serde_json::Value;

/// A request frame sent by the client
///
/// Every request except `authenticate` requires an authenticated
/// connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientRequest {
    /// Present a JWT; must be the first request on the connection
    Authenticate { token: String },

    /// Join a document's room
    JoinDocument { document: DocumentId },

    /// Leave a document's room
    LeaveDocument { document: DocumentId },

    /// Acquire or heartbeat-refresh an exclusive field lock
    LockField {
        document: DocumentId,
        field: FieldName,
    },

    /// Release a held field lock
    UnlockField {
        document: DocumentId,
        field: FieldName,
    },

    /// Start or stop the typing indicator
    SetTyping {
        document: DocumentId,
        is_typing: bool,
    },

    /// Relay a document mutation to the room
    MutateDocument {
        document: DocumentId,
        #[serde(default)]
        field: Option<FieldName>,
        changes: Value,
    },

    /// Explicitly set presence status (e.g. busy)
    SetStatus { status: PresenceStatus },
}

impl ClientRequest {
    /// Wire name of the request, echoed back in acks and rejections
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Authenticate { .. } => "authenticate",
            Self::JoinDocument { .. } => "join-document",
            Self::LeaveDocument { .. } => "leave-document",
            Self::LockField { .. } => "lock-field",
            Self::UnlockField { .. } => "unlock-field",
            Self::SetTyping { .. } => "set-typing",
            Self::MutateDocument { .. } => "mutate-document",
            Self::SetStatus { .. } => "set-status",
        }
    }

    /// Whether this request is gated on authentication
    #[must_use]
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Self::Authenticate { .. })
    }

    /// Deserialize from a JSON text frame
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
