//! Typed facades over the backend's REST endpoints.
//!
//! Each facade borrows an [`ApiClient`](crate::ApiClient) and is obtained
//! from it, e.g. `client.chat().list_sessions()`. All of them share the
//! client's credential handling.

mod auth;
mod chat;
mod consultation;
mod health;
mod profile;
mod research;
mod xray;

pub use auth::AuthApi;
pub use chat::ChatApi;
pub use consultation::ConsultationApi;
pub use health::HealthApi;
pub use profile::ProfileApi;
pub use research::ResearchApi;
pub use xray::XrayApi;
