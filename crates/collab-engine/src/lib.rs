//! # collab-engine
//!
//! In-process engine for real-time collaborative editing of contract
//! documents: session registry, presence tracking, per-document room
//! membership, exclusive TTL-bound field locks, typing indicators, event
//! fan-out, and the inactivity reaper.
//!
//! State lives in process memory and is rebuilt by clients re-joining after
//! a restart. Scaling beyond a single process requires relocating this state
//! to a shared store with atomic conditional writes; this crate is explicitly
//! not cluster-safe.

pub mod dispatch;
pub mod engine;
pub mod presence;
pub mod reaper;
pub mod room;
pub mod session;

pub use dispatch::Dispatcher;
pub use engine::{ActiveLock, CollabEngine, EngineConfig, JoinInfo, MutationSpec};
pub use presence::{PresenceRecord, PresenceTracker, StatusChange};
pub use reaper::Reaper;
pub use room::{FieldLock, LockAttempt, ReleaseOutcome, RoomIndex, RoomState, TypingState};
pub use session::{Session, SessionRegistry};
