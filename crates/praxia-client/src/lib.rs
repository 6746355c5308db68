//! praxia-client - Session-aware client for the Praxia REST API.
//!
//! Every call flows through an [`ApiClient`], which attaches the stored
//! credential, refreshes an expired access token exactly once no matter how
//! many requests notice the expiry together, and evicts the credential when
//! the session cannot be recovered.
//!
//! # Example
//!
//! ```no_run
//! use praxia_client::{ApiClient, ClientConfig};
//! use praxia_core::LoginCredentials;
//!
//! # async fn example() -> Result<(), praxia_core::Error> {
//! let client = ApiClient::with_memory_store(ClientConfig::from_env()?)?;
//! client
//!     .auth()
//!     .login(&LoginCredentials::new("alice@example.com", "hunter2"))
//!     .await?;
//!
//! let profile = client.profile().get().await?;
//! println!("Logged in as {}", profile.username);
//! # Ok(())
//! # }
//! ```

pub mod api;
mod client;
mod config;
pub mod endpoints;
mod events;
pub mod poller;
mod refresh;
mod request;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use events::SessionEvent;
pub use poller::{PollJob, PollOptions, Poller, poll};
pub use refresh::{Acquire, RefreshCoordinator, RefreshLease, RefreshWaiter};
pub use request::{ApiRequest, FilePart, MultipartForm, RequestBody};
