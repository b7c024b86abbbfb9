//! WebSocket close codes
//!
//! Application close codes in the 4000 range, sent when the connection is
//! terminated for a protocol-level reason. Request-level failures are
//! reported with `rejected` frames instead and leave the connection open.

/// Reason codes for server-initiated closes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum CloseCode {
    /// Unclassified server error
    UnknownError = 4000,
    /// Frame was not valid JSON or not a known request
    DecodeError = 4002,
    /// Token validation failed
    AuthenticationFailed = 4004,
}

impl CloseCode {
    /// Numeric close code
    #[must_use]
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Human-readable description for the close frame
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::UnknownError => "Unknown error",
            Self::DecodeError => "Decode error",
            Self::AuthenticationFailed => "Authentication failed",
        }
    }
}

impl std::fmt::Display for CloseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.as_u16(), self.description())
    }
}
