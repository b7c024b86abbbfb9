//! Gateway server setup
//!
//! Router, state construction, and the serve loop.

mod handler;
mod state;

pub use handler::ws_handler;
pub use state::GatewayState;

use crate::auth::JwtAuth;
use axum::{extract::State, routing::get, Json, Router};
use collab_common::{CollabConfig, ConfigError};
use collab_engine::{CollabEngine, EngineConfig, Reaper};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Create the gateway router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_check))
}

/// Health check with live engine counters
async fn health_check(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    let engine = state.engine();
    Json(serde_json::json!({
        "status": "ok",
        "sessions": engine.session_count(),
        "users": engine.user_count(),
        "rooms": engine.room_count(),
    }))
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    create_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the gateway server until shutdown
pub async fn run(config: CollabConfig) -> Result<(), ServerError> {
    let engine = CollabEngine::new(EngineConfig::from(&config));
    let auth = Arc::new(JwtAuth::new(&config.jwt_secret));

    let reaper = Arc::new(Reaper::new(engine.clone(), config.reaper.interval()));
    reaper.clone().start();

    let addr: SocketAddr = config
        .gateway
        .address()
        .parse()
        .map_err(|_| ServerError::InvalidAddress(config.gateway.address()))?;

    let state = GatewayState::new(engine, auth, config);
    let app = create_app(state);

    tracing::info!("Starting gateway on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(addr, e))?;

    tracing::info!("Gateway listening on ws://{}/ws", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)?;

    reaper.stop();
    tracing::info!("Gateway shut down");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}

/// Server startup and runtime errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid gateway address: {0}")]
    InvalidAddress(String),

    #[error("failed to bind to {0}: {1}")]
    Bind(SocketAddr, #[source] std::io::Error),

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
