//! Individual authenticated session
//!
//! A session is one live connection of one user. Authentication happens
//! before the session enters the registry, so a `Session` always carries its
//! owning identity.

use collab_core::{CollabEvent, DocumentId, UserId, UserProfile};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// A single authenticated connection
pub struct Session {
    /// Unique session ID
    session_id: String,

    /// Owning user
    user_id: UserId,

    /// Profile resolved at authentication time
    profile: UserProfile,

    /// Document this session is currently joined to (at most one)
    joined_document: RwLock<Option<DocumentId>>,

    /// Channel delivering events to the transport writer
    sender: mpsc::Sender<CollabEvent>,

    /// Session creation time
    created_at: Instant,
}

impl Session {
    /// Create a new session with a generated ID
    pub fn new(
        user_id: UserId,
        profile: UserProfile,
        sender: mpsc::Sender<CollabEvent>,
    ) -> Arc<Self> {
        Arc::new(Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            user_id,
            profile,
            joined_document: RwLock::new(None),
            sender,
            created_at: Instant::now(),
        })
    }

    /// Get the session ID
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Get the owning user ID
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Get the profile resolved at authentication
    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Get the currently joined document, if any
    pub fn joined_document(&self) -> Option<DocumentId> {
        self.joined_document.read().clone()
    }

    /// Record the document this session joined
    pub fn set_joined_document(&self, doc: Option<DocumentId>) {
        *self.joined_document.write() = doc;
    }

    /// Check whether this session is joined to `doc`
    pub fn is_joined_to(&self, doc: &DocumentId) -> bool {
        self.joined_document.read().as_ref() == Some(doc)
    }

    /// Get session age
    pub fn age(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }

    /// Deliver an event without blocking; a full or closed channel drops the
    /// event for this session only (best-effort fan-out)
    pub fn try_send(&self, event: CollabEvent) -> bool {
        self.sender.try_send(event).is_ok()
    }

    /// Check if the outbound channel is closed
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("session_id", &self.session_id)
            .field("user_id", &self.user_id)
            .field("joined_document", &self.joined_document.read())
            .finish()
    }
}
