//! Wire protocol
//!
//! JSON frames exchanged over the WebSocket. Clients send tagged requests;
//! the server answers each with an ack or a rejection, and pushes room
//! events with a per-connection sequence number.

mod close_codes;
mod messages;
mod requests;

pub use close_codes::CloseCode;
pub use messages::ServerMessage;
pub use requests::ClientRequest;
