//! Application configuration structs
//!
//! Loads configuration from environment variables with sensible defaults.
//! All timeouts here are soft: enforced lazily at next access and by the
//! periodic reaper, never by per-entry timers.

use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Main configuration for the collaboration service
#[derive(Debug, Clone, Deserialize)]
pub struct CollabConfig {
    pub env: Environment,
    pub gateway: ServerConfig,
    pub presence: PresenceConfig,
    pub locks: LockConfig,
    pub typing: TypingConfig,
    pub reaper: ReaperConfig,
    /// HS256 secret for validating client tokens
    pub jwt_secret: String,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Gateway bind configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Presence idle thresholds and policy
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PresenceConfig {
    /// Idle seconds before an online user decays to away
    #[serde(default = "default_away_secs")]
    pub away_after_secs: u64,
    /// Idle seconds before a user decays to offline (full cleanup)
    #[serde(default = "default_offline_secs")]
    pub offline_after_secs: u64,
    /// Whether recorded activity resets an explicitly-set busy status
    #[serde(default)]
    pub activity_clears_busy: bool,
    /// `true` ties presence to a single connection; `false` reference-counts
    /// sessions so a user stays online while any tab remains open
    #[serde(default)]
    pub presence_per_connection: bool,
}

impl PresenceConfig {
    #[must_use]
    pub fn away_after(&self) -> Duration {
        Duration::from_secs(self.away_after_secs)
    }

    #[must_use]
    pub fn offline_after(&self) -> Duration {
        Duration::from_secs(self.offline_after_secs)
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            away_after_secs: default_away_secs(),
            offline_after_secs: default_offline_secs(),
            activity_clears_busy: false,
            presence_per_connection: false,
        }
    }
}

/// Field lock configuration
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LockConfig {
    /// Lock lifetime; refreshed by re-acquire while editing
    #[serde(default = "default_lock_ttl_secs")]
    pub ttl_secs: u64,
}

impl LockConfig {
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_lock_ttl_secs(),
        }
    }
}

/// Typing indicator configuration
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TypingConfig {
    /// Auto-clear window after the last typing-start
    #[serde(default = "default_typing_ttl_secs")]
    pub ttl_secs: u64,
}

impl TypingConfig {
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_typing_ttl_secs(),
        }
    }
}

/// Inactivity reaper configuration
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ReaperConfig {
    /// Sweep interval
    #[serde(default = "default_reaper_interval_secs")]
    pub interval_secs: u64,
}

impl ReaperConfig {
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_reaper_interval_secs(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    4100
}

fn default_away_secs() -> u64 {
    300 // 5 minutes
}

fn default_offline_secs() -> u64 {
    900 // 15 minutes
}

fn default_lock_ttl_secs() -> u64 {
    30
}

fn default_typing_ttl_secs() -> u64 {
    5
}

fn default_reaper_interval_secs() -> u64 {
    60
}

impl Default for CollabConfig {
    fn default() -> Self {
        Self {
            env: Environment::Development,
            gateway: ServerConfig {
                host: default_host(),
                port: default_port(),
            },
            presence: PresenceConfig::default(),
            locks: LockConfig::default(),
            typing: TypingConfig::default(),
            reaper: ReaperConfig::default(),
            jwt_secret: String::new(),
        }
    }
}

impl CollabConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            env: env::var("APP_ENV")
                .ok()
                .and_then(|s| match s.to_lowercase().as_str() {
                    "production" => Some(Environment::Production),
                    "staging" => Some(Environment::Staging),
                    "development" => Some(Environment::Development),
                    _ => None,
                })
                .unwrap_or_default(),
            gateway: ServerConfig {
                host: env::var("GATEWAY_HOST").unwrap_or_else(|_| default_host()),
                port: env::var("GATEWAY_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_port),
            },
            presence: PresenceConfig {
                away_after_secs: env_u64("PRESENCE_AWAY_SECS", default_away_secs()),
                offline_after_secs: env_u64("PRESENCE_OFFLINE_SECS", default_offline_secs()),
                activity_clears_busy: env_bool("PRESENCE_ACTIVITY_CLEARS_BUSY", false),
                presence_per_connection: env_bool("PRESENCE_PER_CONNECTION", false),
            },
            locks: LockConfig {
                ttl_secs: env_u64("LOCK_TTL_SECS", default_lock_ttl_secs()),
            },
            typing: TypingConfig {
                ttl_secs: env_u64("TYPING_TTL_SECS", default_typing_ttl_secs()),
            },
            reaper: ReaperConfig {
                interval_secs: env_u64("REAPER_INTERVAL_SECS", default_reaper_interval_secs()),
            },
            jwt_secret: env::var("JWT_SECRET").map_err(|_| ConfigError::MissingVar("JWT_SECRET"))?,
        })
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .and_then(|s| match s.to_lowercase().as_str() {
            "1" | "true" | "yes" => Some(true),
            "0" | "false" | "no" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),
}
