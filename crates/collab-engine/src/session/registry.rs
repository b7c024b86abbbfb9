//! Session registry
//!
//! Tracks all live sessions with secondary indexes by user and by joined
//! document, using `DashMap` for concurrent access.

use super::Session;
use collab_core::{DocumentId, UserId};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;

/// Registry of all live sessions
///
/// Uses `alter`/`retain` for atomic modify-and-cleanup so index entries never
/// go stale between a lookup and a removal.
pub struct SessionRegistry {
    /// Active sessions by session ID
    sessions: DashMap<String, Arc<Session>>,

    /// User ID to session IDs mapping
    user_sessions: DashMap<UserId, HashSet<String>>,

    /// Document ID to session IDs of currently-joined sessions
    document_sessions: DashMap<DocumentId, HashSet<String>>,
}

impl SessionRegistry {
    /// Create a new registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            user_sessions: DashMap::new(),
            document_sessions: DashMap::new(),
        }
    }

    /// Register a session
    pub fn add(&self, session: Arc<Session>) {
        let session_id = session.session_id().to_string();
        self.user_sessions
            .entry(session.user_id())
            .or_default()
            .insert(session_id.clone());
        self.sessions.insert(session_id.clone(), session);

        tracing::debug!(session_id = %session_id, "Session registered");
    }

    /// Remove a session, cleaning up both indexes
    ///
    /// Returns the removed session so the caller can run disconnect cleanup.
    pub fn remove(&self, session_id: &str) -> Option<Arc<Session>> {
        let (_, session) = self.sessions.remove(session_id)?;

        self.user_sessions.alter(&session.user_id(), |_, mut ids| {
            ids.remove(session_id);
            ids
        });
        self.user_sessions.retain(|_, ids| !ids.is_empty());

        if let Some(doc) = session.joined_document() {
            self.document_sessions.alter(&doc, |_, mut ids| {
                ids.remove(session_id);
                ids
            });
            self.document_sessions.retain(|_, ids| !ids.is_empty());
        }

        tracing::debug!(session_id = %session_id, "Session removed");

        Some(session)
    }

    /// Get a session by ID
    pub fn get(&self, session_id: &str) -> Option<Arc<Session>> {
        self.sessions.get(session_id).map(|r| r.clone())
    }

    /// Record that a session joined a document
    pub fn attach_document(&self, session: &Session, doc: &DocumentId) {
        session.set_joined_document(Some(doc.clone()));
        self.document_sessions
            .entry(doc.clone())
            .or_default()
            .insert(session.session_id().to_string());
    }

    /// Record that a session left its document, returning it
    pub fn detach_document(&self, session: &Session) -> Option<DocumentId> {
        let doc = session.joined_document()?;
        session.set_joined_document(None);

        self.document_sessions.alter(&doc, |_, mut ids| {
            ids.remove(session.session_id());
            ids
        });
        self.document_sessions.retain(|_, ids| !ids.is_empty());

        Some(doc)
    }

    /// All sessions currently joined to a document, resolved at call time
    pub fn sessions_for_document(&self, doc: &DocumentId) -> Vec<Arc<Session>> {
        self.document_sessions
            .get(doc)
            .map(|ids| {
                ids.iter()
                    .filter_map(|sid| self.sessions.get(sid).map(|s| s.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All sessions belonging to a user
    pub fn sessions_for_user(&self, user_id: UserId) -> Vec<Arc<Session>> {
        self.user_sessions
            .get(&user_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|sid| self.sessions.get(sid).map(|s| s.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of live sessions a user has
    pub fn user_session_count(&self, user_id: UserId) -> usize {
        self.user_sessions.get(&user_id).map_or(0, |ids| ids.len())
    }

    /// Whether the user has a live session joined to `doc`
    pub fn user_joined_to(&self, user_id: UserId, doc: &DocumentId) -> bool {
        self.sessions_for_user(user_id)
            .iter()
            .any(|s| s.is_joined_to(doc))
    }

    /// Total number of live sessions
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Number of distinct users with live sessions
    pub fn user_count(&self) -> usize {
        self.user_sessions.len()
    }

    /// Session IDs whose outbound channel has closed without a clean
    /// disconnect (reaper backstop)
    pub fn closed_sessions(&self) -> Vec<String> {
        self.sessions
            .iter()
            .filter(|r| r.is_closed())
            .map(|r| r.key().clone())
            .collect()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.sessions.len())
            .field("users", &self.user_sessions.len())
            .field("documents", &self.document_sessions.len())
            .finish()
    }
}
