//! Request handlers
//!
//! Maps parsed client requests onto engine operations. One dispatcher per
//! connection task; the connection's session is created by `authenticate`
//! and carried here for every later request.

mod error;

pub use error::{HandlerError, HandlerResult};

use crate::protocol::{ClientRequest, ServerMessage};
use crate::server::GatewayState;
use collab_core::CollabEvent;
use collab_engine::{MutationSpec, Session};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Per-connection handler state
#[derive(Debug, Default)]
pub struct ConnectionContext {
    /// Set by a successful `authenticate`; `None` until then
    pub session: Option<Arc<Session>>,
}

impl ConnectionContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Dispatches client requests to the engine
pub struct RequestDispatcher;

impl RequestDispatcher {
    /// Handle one client request, returning the ack to send back
    pub fn dispatch(
        state: &GatewayState,
        ctx: &mut ConnectionContext,
        events: &mpsc::Sender<CollabEvent>,
        request: ClientRequest,
    ) -> HandlerResult<ServerMessage> {
        let name = request.name();

        if request.requires_auth() && ctx.session.is_none() {
            return Err(HandlerError::NotAuthenticated);
        }

        let engine = state.engine();

        match request {
            ClientRequest::Authenticate { token } => {
                Self::authenticate(state, ctx, events, name, &token)
            }
            ClientRequest::JoinDocument { document } => {
                let session = Self::session(ctx)?;
                let info = engine.join_document(&session, &document)?;
                Ok(ServerMessage::ack_with(name, &info))
            }
            ClientRequest::LeaveDocument { document } => {
                let session = Self::session(ctx)?;
                engine.leave_document(&session, &document)?;
                Ok(ServerMessage::ack(name))
            }
            ClientRequest::LockField { document, field } => {
                let session = Self::session(ctx)?;
                engine.lock_field(&session, &document, &field)?;
                Ok(ServerMessage::ack(name))
            }
            ClientRequest::UnlockField { document, field } => {
                let session = Self::session(ctx)?;
                engine.unlock_field(&session, &document, &field)?;
                Ok(ServerMessage::ack(name))
            }
            ClientRequest::SetTyping {
                document,
                is_typing,
            } => {
                let session = Self::session(ctx)?;
                engine.set_typing(&session, &document, is_typing)?;
                Ok(ServerMessage::ack(name))
            }
            ClientRequest::MutateDocument {
                document,
                field,
                changes,
            } => {
                let session = Self::session(ctx)?;
                engine.mutate_document(&session, &document, MutationSpec { field, changes })?;
                Ok(ServerMessage::ack(name))
            }
            ClientRequest::SetStatus { status } => {
                let session = Self::session(ctx)?;
                engine.set_status(session.user_id(), status);
                Ok(ServerMessage::ack(name))
            }
        }
    }

    /// The connection's session; gated callers never see the error
    fn session(ctx: &ConnectionContext) -> HandlerResult<Arc<Session>> {
        ctx.session.clone().ok_or(HandlerError::NotAuthenticated)
    }

    fn authenticate(
        state: &GatewayState,
        ctx: &mut ConnectionContext,
        events: &mpsc::Sender<CollabEvent>,
        name: &str,
        token: &str,
    ) -> HandlerResult<ServerMessage> {
        if ctx.session.is_some() {
            return Err(HandlerError::AlreadyAuthenticated);
        }

        let identity = state.auth().authenticate(token)?;
        let session = state
            .engine()
            .connect(identity.user_id, identity.profile, events.clone());

        tracing::info!(
            session_id = %session.session_id(),
            user_id = %identity.user_id,
            "Connection authenticated"
        );

        let ack = ServerMessage::ack_with(
            name,
            &serde_json::json!({
                "session_id": session.session_id(),
                "user_id": identity.user_id,
            }),
        );
        ctx.session = Some(session);
        Ok(ack)
    }
}
