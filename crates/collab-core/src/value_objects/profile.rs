//! Minimal user profile carried alongside presence

use serde::{Deserialize, Serialize};

/// Profile attached to an authenticated identity, shown to room members
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserProfile {
    /// Display name shown in rosters and cursors
    pub display_name: String,
    /// Optional email for avatar resolution on the client
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserProfile {
    /// Create a profile with just a display name
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            email: None,
        }
    }

    /// Set the email
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}
