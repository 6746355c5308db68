//! praxia-core - Core types for the Praxia API client.
//!
//! Holds the unified error type, credential and token types, the
//! [`CredentialStore`] abstraction, backend models, and the assistant
//! message content parser. Nothing in this crate touches the network.

pub mod content;
pub mod credentials;
pub mod error;
pub mod models;
pub mod store;
pub mod tokens;
pub mod types;

pub use credentials::{Credential, LoginCredentials};
pub use error::Error;
pub use store::{CredentialStore, MemoryCredentialStore};
pub use tokens::{AccessToken, RefreshToken, SessionKey};
pub use types::ApiUrl;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
