//! Configuration loading

mod app_config;

pub use app_config::{
    CollabConfig, ConfigError, Environment, LockConfig, PresenceConfig, ReaperConfig,
    ServerConfig, TypingConfig,
};
