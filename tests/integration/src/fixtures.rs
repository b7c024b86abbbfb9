//! Test fixtures: engine configurations and signed tokens

use chrono::Utc;
use collab_common::PresenceConfig;
use collab_engine::{CollabEngine, EngineConfig};
use collab_gateway::auth::Claims;
use jsonwebtoken::{encode, EncodingKey, Header};
use std::sync::Arc;

/// Shared secret used by gateway tests
pub const TEST_SECRET: &str = "integration-test-secret-key";

/// Engine with default thresholds and policies
pub fn default_engine() -> Arc<CollabEngine> {
    CollabEngine::new(EngineConfig::default())
}

/// Config with presence tied to individual connections
#[must_use]
pub fn per_connection_presence() -> EngineConfig {
    EngineConfig {
        presence: PresenceConfig {
            presence_per_connection: true,
            ..PresenceConfig::default()
        },
        ..EngineConfig::default()
    }
}

/// Config where recorded activity clears an explicit busy status
#[must_use]
pub fn activity_clears_busy() -> EngineConfig {
    EngineConfig {
        presence: PresenceConfig {
            activity_clears_busy: true,
            ..PresenceConfig::default()
        },
        ..EngineConfig::default()
    }
}

/// Mint a token for the given user, valid for an hour
pub fn mint_token(user: i64, name: &str) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user.to_string(),
        name: name.to_string(),
        email: None,
        iat: now,
        exp: now + 3600,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("token encoding")
}
