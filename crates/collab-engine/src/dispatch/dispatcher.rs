//! Event fan-out to room sessions
//!
//! Membership is resolved at publish time, so a session that has already
//! disconnected is simply absent. Delivery is best-effort: no retry, no
//! durability; a session with a full or closed channel misses the event
//! without affecting the others.

use crate::session::SessionRegistry;
use collab_core::{CollabEvent, CollabEventType, DocumentId, UserId};
use serde::Serialize;
use std::sync::Arc;

/// Publishes events to every session joined to a document
pub struct Dispatcher {
    registry: Arc<SessionRegistry>,
}

impl Dispatcher {
    /// Create a dispatcher over the session registry
    #[must_use]
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// Publish an event to the document's room, optionally skipping the
    /// originating user's sessions
    ///
    /// Returns the number of sessions the event was handed to.
    pub fn publish<P: Serialize>(
        &self,
        doc: &DocumentId,
        event_type: CollabEventType,
        payload: &P,
        exclude_user: Option<UserId>,
    ) -> usize {
        let event = CollabEvent::new(doc.clone(), event_type, payload);
        let mut sent = 0;

        for session in self.registry.sessions_for_document(doc) {
            if Some(session.user_id()) == exclude_user {
                continue;
            }
            if session.try_send(event.clone()) {
                sent += 1;
            }
        }

        tracing::trace!(
            document = %doc,
            event = %event_type,
            sent = sent,
            "Event published to room"
        );

        sent
    }

    /// Deliver an event to one user's sessions only (e.g. a lock denial
    /// addressed to the requester)
    pub fn publish_to_user<P: Serialize>(
        &self,
        doc: &DocumentId,
        event_type: CollabEventType,
        payload: &P,
        user_id: UserId,
    ) -> usize {
        let event = CollabEvent::new(doc.clone(), event_type, payload);
        let mut sent = 0;

        for session in self.registry.sessions_for_user(user_id) {
            if session.try_send(event.clone()) {
                sent += 1;
            }
        }

        sent
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish()
    }
}
