//! Subcommand implementations.

pub mod auth;
pub mod chat;
pub mod health;
pub mod profile;
pub mod xray;
