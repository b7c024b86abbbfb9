//! Value objects shared across the workspace

mod ids;
mod presence_status;
mod profile;

pub use ids::{DocumentId, FieldName, UserId, UserIdParseError};
pub use presence_status::{PresenceStatus, StatusParseError};
pub use profile::UserProfile;
