//! Research query endpoints.

use tracing::instrument;

use praxia_core::Result;
use praxia_core::models::{ResearchQuery, ResearchRequest};

use crate::client::ApiClient;
use crate::endpoints;
use crate::request::ApiRequest;

#[derive(Debug, Clone, Copy)]
pub struct ResearchApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ResearchApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<ResearchQuery>> {
        self.client.request(ApiRequest::get(endpoints::RESEARCH)).await
    }

    #[instrument(skip(self))]
    pub async fn create(&self, query: &str) -> Result<ResearchQuery> {
        let request = ApiRequest::post(endpoints::RESEARCH).json(&ResearchRequest { query })?;
        self.client.request(request).await
    }
}
