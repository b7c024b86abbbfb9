//! # collab-core
//!
//! Domain layer for the collaboration engine: identifiers, the error
//! taxonomy, and the outbound event model. This crate has zero dependencies
//! on infrastructure (runtime, web framework, etc.).

pub mod error;
pub mod events;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use error::{CollabError, CollabResult};
pub use events::{
    CollabEvent, CollabEventType, DocumentMutatedPayload, FieldLockDeniedPayload,
    FieldLockPayload, FieldPayload, PresenceChangedPayload, RosterEntry, TypingPayload,
    UserJoinedPayload, UserLeftPayload,
};
pub use value_objects::{
    DocumentId, FieldName, PresenceStatus, StatusParseError, UserId, UserIdParseError,
    UserProfile,
};
