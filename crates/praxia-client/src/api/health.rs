//! Backend health endpoints.

use tracing::instrument;

use praxia_core::Result;
use praxia_core::models::{AuthenticatedHealthStatus, HealthStatus};

use crate::client::ApiClient;
use crate::endpoints;
use crate::request::ApiRequest;

#[derive(Debug, Clone, Copy)]
pub struct HealthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> HealthApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Public liveness check.
    #[instrument(skip(self))]
    pub async fn check(&self) -> Result<HealthStatus> {
        self.client
            .request(ApiRequest::get(endpoints::HEALTH).public())
            .await
    }

    /// Detailed service status; requires a session.
    #[instrument(skip(self))]
    pub async fn check_authenticated(&self) -> Result<AuthenticatedHealthStatus> {
        self.client
            .request(ApiRequest::get(endpoints::HEALTH_AUTHENTICATED))
            .await
    }
}
