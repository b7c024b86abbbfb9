//! Presence tracker
//!
//! Per-user online/away/busy/offline state machine with an activity clock.

mod tracker;

pub use tracker::{PresenceRecord, PresenceTracker, StatusChange};
