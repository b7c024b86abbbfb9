//! # collab-common
//!
//! Cross-cutting infrastructure shared by the engine and gateway:
//! configuration loading and tracing setup.

pub mod config;
pub mod telemetry;

pub use config::{
    CollabConfig, ConfigError, Environment, LockConfig, PresenceConfig, ReaperConfig,
    ServerConfig, TypingConfig,
};
pub use telemetry::{init_tracing, try_init_tracing, TracingConfig, TracingError};
