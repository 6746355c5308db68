//! Error types for the Praxia client.
//!
//! This module provides a unified error type with explicit variants for
//! transport, authentication, server rejection, polling and input errors.
//! Every variant is cheap to clone so a single refresh outcome can be handed
//! to every caller waiting on it.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// The unified error type for Praxia client operations.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Network transport errors (no response, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Authentication errors that could not be resolved by a token refresh.
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// The backend rejected the request with a non-success status.
    #[error("server rejected request: {0}")]
    Protocol(#[from] ProtocolError),

    /// Result polling did not reach a terminal state.
    #[error("polling error: {0}")]
    Poll(#[from] PollError),

    /// Input validation errors (bad URL, header value, response body).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

impl Error {
    /// Returns true if this error means the user must log in again.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Error::Auth(AuthError::AuthExpired { .. }))
    }

    /// Returns true if the request hit its deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Transport(TransportError::Timeout { .. }))
    }

    /// Returns the HTTP status for server rejections.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Protocol(err) => Some(err.status),
            _ => None,
        }
    }

    /// Text suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            Error::Transport(TransportError::NoResponse { .. }) => {
                "No response received from server. Please check your connection and ensure the backend is running.".to_string()
            }
            Error::Transport(TransportError::Timeout { .. }) => {
                "Request timed out. Please try again.".to_string()
            }
            Error::Transport(TransportError::Http { message }) => message.clone(),
            Error::Auth(_) => "Your session has expired. Please log in again.".to_string(),
            Error::Protocol(err) => err.message.clone(),
            Error::Poll(PollError::Timeout { .. }) => {
                "Analysis is taking too long. Please check back later.".to_string()
            }
            Error::Poll(PollError::Exhausted { .. }) => {
                "Error checking analysis status.".to_string()
            }
            Error::InvalidInput(err) => err.to_string(),
        }
    }
}

/// Transport-level errors.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The request reached no server (DNS, connection refused, TLS).
    #[error("no response received: {message}")]
    NoResponse { message: String },

    /// The request exceeded its deadline.
    #[error("request timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Any other HTTP-level failure.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// Authentication-related errors.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// A 401 that a refresh could not resolve. Credentials have been cleared.
    #[error("re-authentication required: {reason}")]
    AuthExpired { reason: String },
}

impl AuthError {
    pub fn expired(reason: impl Into<String>) -> Self {
        AuthError::AuthExpired {
            reason: reason.into(),
        }
    }
}

/// A non-success response from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolError {
    /// HTTP status code.
    pub status: u16,
    /// Message extracted from the error body.
    pub message: String,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}: {}", self.status, self.message)
    }
}

impl std::error::Error for ProtocolError {}

impl ProtocolError {
    /// Create a new protocol error.
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Build an error from a raw response body.
    ///
    /// The message is taken from `detail`, then `error`, then a bare string
    /// body, then assembled from field-level validation errors. Anything else
    /// falls back to `Server error (<status>)`.
    pub fn from_body(status: u16, body: &str) -> Self {
        let message = match serde_json::from_str::<Value>(body) {
            Ok(value) => message_from_json(&value),
            Err(_) => {
                let text = body.trim();
                (!text.is_empty()).then(|| text.to_string())
            }
        };

        Self::new(
            status,
            message.unwrap_or_else(|| format!("Server error ({})", status)),
        )
    }

    /// Check if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        self.status == 401
    }
}

fn message_from_json(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(map) => {
            for key in ["detail", "error"] {
                if let Some(v) = map.get(key).filter(|v| is_truthy(v)) {
                    return Some(value_text(v));
                }
            }

            let fields: Vec<String> = map
                .iter()
                .filter(|(key, _)| *key != "detail" && *key != "error")
                .map(|(key, value)| match value {
                    Value::Array(items) => {
                        let joined: Vec<String> = items.iter().map(value_text).collect();
                        format!("{}: {}", key, joined.join(", "))
                    }
                    other => format!("{}: {}", key, value_text(other)),
                })
                .collect();

            (!fields.is_empty()).then(|| fields.join("; "))
        }
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Errors from the result poller.
#[derive(Debug, Clone, Error)]
pub enum PollError {
    /// Every attempt observed the processing sentinel.
    #[error("still processing after {attempts} attempts")]
    Timeout { attempts: u32 },

    /// The final attempt failed to fetch the status.
    #[error("status check failed after {attempts} attempts: {last_error}")]
    Exhausted {
        attempts: u32,
        last_error: Box<Error>,
    },
}

/// Input validation errors.
#[derive(Debug, Clone, Error)]
pub enum InvalidInputError {
    /// Invalid API base URL.
    #[error("invalid API URL '{value}': {reason}")]
    ApiUrl { value: String, reason: String },

    /// A header value could not be encoded.
    #[error("invalid header '{name}': {reason}")]
    Header { name: String, reason: String },

    /// A response body did not match the expected shape.
    #[error("could not decode response: {message}")]
    Decode { message: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}
