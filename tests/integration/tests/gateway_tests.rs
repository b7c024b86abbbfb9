//! Gateway request flow
//!
//! Exercises the gateway's dispatch path end to end: token validation,
//! the auth gate, and request-to-engine wiring, using real signed tokens.

use collab_common::CollabConfig;
use collab_core::{CollabEvent, CollabEventType};
use collab_gateway::auth::JwtAuth;
use collab_gateway::handlers::{ConnectionContext, RequestDispatcher};
use collab_gateway::protocol::{ClientRequest, ServerMessage};
use collab_gateway::server::GatewayState;
use integration_tests::{default_engine, mint_token, TEST_SECRET};
use std::sync::Arc;
use tokio::sync::mpsc;

struct GatewayClient {
    ctx: ConnectionContext,
    events_tx: mpsc::Sender<CollabEvent>,
    events: mpsc::Receiver<CollabEvent>,
}

impl GatewayClient {
    fn new() -> Self {
        let (events_tx, events) = mpsc::channel(64);
        Self {
            ctx: ConnectionContext::new(),
            events_tx,
            events,
        }
    }

    fn request(&mut self, state: &GatewayState, json: &str) -> Result<ServerMessage, String> {
        let request = ClientRequest::from_json(json).map_err(|e| e.to_string())?;
        RequestDispatcher::dispatch(state, &mut self.ctx, &self.events_tx, request)
            .map_err(|e| e.code().to_string())
    }

    fn authenticate(&mut self, state: &GatewayState, user: i64, name: &str) -> ServerMessage {
        let token = mint_token(user, name);
        self.request(
            state,
            &format!(r#"{{"type":"authenticate","token":"{token}"}}"#),
        )
        .expect("authentication")
    }
}

fn setup() -> GatewayState {
    GatewayState::new(
        default_engine(),
        Arc::new(JwtAuth::new(TEST_SECRET)),
        CollabConfig::default(),
    )
}

#[tokio::test]
async fn test_requests_rejected_before_authentication() {
    let state = setup();
    let mut client = GatewayClient::new();

    let err = client
        .request(&state, r#"{"type":"join-document","document":"C1"}"#)
        .unwrap_err();
    assert_eq!(err, "AUTH_REQUIRED");
    assert_eq!(state.engine().session_count(), 0);
}

#[tokio::test]
async fn test_invalid_token_rejected() {
    let state = setup();
    let mut client = GatewayClient::new();

    let err = client
        .request(&state, r#"{"type":"authenticate","token":"not-a-jwt"}"#)
        .unwrap_err();
    assert_eq!(err, "AUTH_FAILED");
}

#[tokio::test]
async fn test_authenticated_flow_reaches_other_clients() {
    let state = setup();
    let mut alice = GatewayClient::new();
    let mut bob = GatewayClient::new();

    let ack = alice.authenticate(&state, 1, "Alice");
    match ack {
        ServerMessage::Ack {
            data: Some(data), ..
        } => assert_eq!(data["user_id"], "1"),
        other => panic!("unexpected ack: {other:?}"),
    }
    bob.authenticate(&state, 2, "Bob");

    alice
        .request(&state, r#"{"type":"join-document","document":"C1"}"#)
        .unwrap();
    bob.request(&state, r#"{"type":"join-document","document":"C1"}"#)
        .unwrap();

    // Alice locks a field; Bob's connection gets the broadcast
    alice
        .request(
            &state,
            r#"{"type":"lock-field","document":"C1","field":"payment_terms"}"#,
        )
        .unwrap();
    let event = bob.events.try_recv().expect("field-locked frame");
    assert_eq!(event.event, CollabEventType::FieldLocked);
    assert_eq!(event.data["user_id"], "1");

    // Bob's conflicting lock is rejected with the engine's code and a
    // targeted denial frame
    let err = bob
        .request(
            &state,
            r#"{"type":"lock-field","document":"C1","field":"payment_terms"}"#,
        )
        .unwrap_err();
    assert_eq!(err, "LOCK_HELD");
    let denial = bob.events.try_recv().expect("denial frame");
    assert_eq!(denial.event, CollabEventType::FieldLockDenied);

    // A mutation without a field is relayed
    alice
        .request(
            &state,
            r#"{"type":"mutate-document","document":"C1","changes":{"title":"Renewal"}}"#,
        )
        .unwrap();
    let event = bob.events.try_recv().expect("document-mutated frame");
    assert_eq!(event.event, CollabEventType::DocumentMutated);
    assert_eq!(event.data["changes"]["title"], "Renewal");
}

#[tokio::test]
async fn test_set_status_broadcast() {
    let state = setup();
    let mut alice = GatewayClient::new();
    let mut bob = GatewayClient::new();
    alice.authenticate(&state, 1, "Alice");
    bob.authenticate(&state, 2, "Bob");

    alice
        .request(&state, r#"{"type":"join-document","document":"C1"}"#)
        .unwrap();
    bob.request(&state, r#"{"type":"join-document","document":"C1"}"#)
        .unwrap();
    let _ = alice.events.try_recv(); // Bob's join announcement

    bob.request(&state, r#"{"type":"set-status","status":"busy"}"#)
        .unwrap();
    let event = alice.events.try_recv().expect("presence frame");
    assert_eq!(event.event, CollabEventType::PresenceChanged);
    assert_eq!(event.data["status"], "busy");
}
