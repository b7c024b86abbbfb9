//! Error taxonomy for the collaboration subsystem

mod collab_error;

pub use collab_error::{CollabError, CollabResult};
