//! Request and response bodies exchanged with the backend.
//!
//! Field names follow the backend's snake_case JSON, so most types need no
//! serde renames. Optional response fields default rather than fail, since the
//! backend omits them freely.

mod auth;
mod chat;
mod consultation;
mod health;
mod profile;
mod research;
mod xray;

pub use auth::*;
pub use chat::*;
pub use consultation::*;
pub use health::*;
pub use profile::*;
pub use research::*;
pub use xray::*;

use serde::{Deserialize, Serialize};

/// A resource whose status can be polled until it leaves a processing state.
pub trait PollStatus {
    /// Returns true while the resource still carries the processing marker.
    fn is_processing(&self) -> bool;
}

/// Generic `{ "message": ... }` acknowledgement body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}
