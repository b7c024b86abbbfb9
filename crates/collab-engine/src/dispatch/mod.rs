//! Broadcast dispatcher
//!
//! Fan-out of events to all sessions in a document's room.

mod dispatcher;

pub use dispatcher::Dispatcher;
