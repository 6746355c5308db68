//! Client configuration.

use std::time::Duration;

use praxia_core::{ApiUrl, Result};

use crate::poller::PollOptions;

/// Environment variable holding the API base URL.
pub const API_URL_ENV: &str = "PRAXIA_API_URL";

/// Settings for an [`ApiClient`](crate::ApiClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every endpoint path is resolved against.
    pub api_url: ApiUrl,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Deadline for requests that do not set their own.
    pub request_timeout: Duration,
    /// Deadline for text-only chat messages.
    pub chat_text_timeout: Duration,
    /// Deadline for chat messages carrying an X-ray file.
    pub chat_file_timeout: Duration,
    /// Polling schedule for X-ray analysis results.
    pub xray_poll: PollOptions,
    /// Polling schedule used while a chat message waits on an X-ray.
    pub chat_xray_poll: PollOptions,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: ApiUrl::default(),
            user_agent: concat!("praxia-client/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout: Duration::from_secs(30),
            chat_text_timeout: Duration::from_secs(90),
            chat_file_timeout: Duration::from_secs(180),
            xray_poll: PollOptions::default(),
            chat_xray_poll: PollOptions::new(Duration::from_secs(10), 30),
        }
    }
}

impl ClientConfig {
    /// Defaults, with the base URL taken from `PRAXIA_API_URL` when set.
    pub fn from_env() -> Result<Self> {
        match std::env::var(API_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => {
                Ok(Self::default().with_api_url(ApiUrl::new(url.trim())?))
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn with_api_url(mut self, api_url: ApiUrl) -> Self {
        self.api_url = api_url;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_backend_expectations() {
        let config = ClientConfig::default();
        assert_eq!(config.api_url.as_str(), "http://localhost:8000/api");
        assert_eq!(config.chat_text_timeout, Duration::from_secs(90));
        assert_eq!(config.chat_file_timeout, Duration::from_secs(180));
        assert_eq!(config.xray_poll, PollOptions::new(Duration::from_millis(2000), 30));
        assert!(config.user_agent.starts_with("praxia-client/"));
    }
}
