//! Gateway state
//!
//! Shared dependencies for the gateway server.

use crate::auth::AuthService;
use collab_common::CollabConfig;
use collab_engine::CollabEngine;
use std::sync::Arc;

/// Gateway application state
#[derive(Clone)]
pub struct GatewayState {
    /// The collaboration engine
    engine: Arc<CollabEngine>,
    /// Token validator
    auth: Arc<dyn AuthService>,
    /// Application configuration
    config: Arc<CollabConfig>,
}

impl GatewayState {
    /// Create a new gateway state
    pub fn new(engine: Arc<CollabEngine>, auth: Arc<dyn AuthService>, config: CollabConfig) -> Self {
        Self {
            engine,
            auth,
            config: Arc::new(config),
        }
    }

    /// Get the engine
    pub fn engine(&self) -> &Arc<CollabEngine> {
        &self.engine
    }

    /// Get the token validator
    pub fn auth(&self) -> &Arc<dyn AuthService> {
        &self.auth
    }

    /// Get the application configuration
    pub fn config(&self) -> &CollabConfig {
        &self.config
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("sessions", &self.engine.session_count())
            .field("rooms", &self.engine.room_count())
            .finish_non_exhaustive()
    }
}
