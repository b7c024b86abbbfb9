//! # collab-gateway
//!
//! WebSocket gateway for the collaboration engine. Clients connect to
//! `/ws`, authenticate with a JWT, and exchange JSON frames: requests in,
//! acks plus room events out.

pub mod auth;
pub mod handlers;
pub mod protocol;
pub mod server;

pub use server::run;
