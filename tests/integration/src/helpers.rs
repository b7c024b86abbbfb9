//! Test helpers
//!
//! An in-memory client wraps a session plus the receiving end of its event
//! channel, so tests can drive the engine and assert on the frames each
//! connection would have been sent.

use collab_core::{CollabEvent, CollabEventType, DocumentId, UserId, UserProfile};
use collab_engine::{CollabEngine, Session};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Channel capacity for test clients
const EVENT_BUFFER: usize = 64;

/// A connected client under test
pub struct TestClient {
    pub session: Arc<Session>,
    pub events: mpsc::Receiver<CollabEvent>,
}

impl TestClient {
    /// Drain all buffered events
    pub fn drain(&mut self) -> Vec<CollabEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }

    /// Drain and return only the event types, in arrival order
    pub fn drain_types(&mut self) -> Vec<CollabEventType> {
        self.drain().into_iter().map(|e| e.event).collect()
    }

    /// Assert the next buffered event has the given type and return it
    pub fn expect_event(&mut self, event_type: CollabEventType) -> CollabEvent {
        match self.events.try_recv() {
            Ok(event) => {
                assert_eq!(
                    event.event, event_type,
                    "expected {event_type}, got {} with data {}",
                    event.event, event.data
                );
                event
            }
            Err(_) => panic!("expected {event_type}, but no event was buffered"),
        }
    }

    /// Assert no events are buffered
    pub fn expect_silence(&mut self) {
        if let Ok(event) = self.events.try_recv() {
            panic!("expected no events, got {} with data {}", event.event, event.data);
        }
    }

    /// The client's user id
    pub fn user_id(&self) -> UserId {
        self.session.user_id()
    }
}

/// Connect a client with the given numeric user id and display name
pub fn connect(engine: &CollabEngine, user: i64, name: &str) -> TestClient {
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let session = engine.connect(UserId::new(user), UserProfile::new(name), tx);
    TestClient {
        session,
        events: rx,
    }
}

/// Shorthand for a document id
pub fn doc(id: &str) -> DocumentId {
    DocumentId::from(id)
}
