//! Client construction for CLI commands.

pub mod storage;

use std::sync::Arc;

use anyhow::{Context, Result};
use praxia_client::{ApiClient, ClientConfig};
use praxia_core::ApiUrl;
use praxia_file::FileCredentialStore;

/// Build a client backed by the persisted credential.
///
/// The base URL comes from `--api-url` when given, otherwise from the
/// environment.
pub fn open_client(api_url: Option<&str>) -> Result<ApiClient> {
    let mut config = ClientConfig::from_env().context("Invalid PRAXIA_API_URL")?;
    if let Some(url) = api_url {
        config = config.with_api_url(ApiUrl::new(url).context("Invalid --api-url")?);
    }

    let path = storage::credential_path()?;
    let store = FileCredentialStore::open(&path)
        .with_context(|| format!("Failed to open credential file {}", path.display()))?;

    tracing::debug!(path = %path.display(), api_url = %config.api_url, "Opening client");
    ApiClient::new(config, Arc::new(store)).context("Failed to create API client")
}

/// Fail early with a helpful message when no one is logged in.
pub fn require_login(client: &ApiClient) -> Result<()> {
    if client.is_authenticated() {
        Ok(())
    } else {
        anyhow::bail!("Not logged in. Run 'praxia auth login' first.")
    }
}
