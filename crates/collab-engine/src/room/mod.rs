//! Per-document room state
//!
//! Membership, exclusive field locks, and typing indicators for one
//! document, plus the index that serializes all mutations per document.

mod index;
mod state;

pub use index::RoomIndex;
pub use state::{FieldLock, LockAttempt, ReleaseOutcome, RoomState, RoomSweep, TypingState};
