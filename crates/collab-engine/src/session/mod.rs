//! Connection registry
//!
//! Maps active connections to authenticated identities and tracks which
//! document each session has joined.

mod registry;
mod session;

pub use registry::SessionRegistry;
pub use session::Session;
