//! Integration test utilities for the collaboration service
//!
//! Provides helpers for driving the engine with in-memory clients and
//! fixtures for configs and tokens.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
