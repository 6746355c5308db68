//! X-ray analysis endpoints.

use tracing::{info, instrument};

use praxia_core::Result;
use praxia_core::models::XrayAnalysis;

use crate::client::ApiClient;
use crate::endpoints;
use crate::poller::{PollJob, PollOptions, Poller, poll};
use crate::request::{ApiRequest, FilePart, MultipartForm};

/// X-ray analysis endpoints.
#[derive(Debug, Clone, Copy)]
pub struct XrayApi<'a> {
    client: &'a ApiClient,
}

impl<'a> XrayApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<XrayAnalysis>> {
        self.client
            .request(ApiRequest::get(endpoints::XRAY_ANALYSES))
            .await
    }

    /// Upload an image for analysis. The returned analysis is usually still
    /// processing; see [`poll_for_results`](Self::poll_for_results).
    #[instrument(skip(self, image), fields(file = %image.file_name))]
    pub async fn upload(&self, image: FilePart) -> Result<XrayAnalysis> {
        let form = MultipartForm::new().file("image", image);
        let analysis: XrayAnalysis = self
            .client
            .request(ApiRequest::post(endpoints::XRAY_ANALYSES).multipart(form))
            .await?;
        info!(id = analysis.id, "X-ray uploaded");
        Ok(analysis)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<XrayAnalysis> {
        self.client
            .request(ApiRequest::get(endpoints::xray_analysis(id)))
            .await
    }

    /// Poll an analysis until it is no longer processing.
    ///
    /// Uses the client's configured schedule unless `options` is given.
    #[instrument(skip(self))]
    pub async fn poll_for_results(
        &self,
        id: i64,
        options: Option<PollOptions>,
    ) -> Result<XrayAnalysis> {
        let options = options.unwrap_or(self.client.config().xray_poll);
        let api = *self;
        poll(move || async move { api.get(id).await }, options).await
    }

    /// Poll an analysis in the background, reporting to `on_complete`.
    ///
    /// Watching an analysis that is already being watched by `poller`
    /// replaces the earlier job.
    pub fn watch<C>(
        &self,
        poller: &Poller<i64>,
        id: i64,
        options: Option<PollOptions>,
        on_complete: C,
    ) -> PollJob<i64>
    where
        C: FnOnce(Result<XrayAnalysis>) + Send + 'static,
    {
        let options = options.unwrap_or(self.client.config().xray_poll);
        let client = self.client.clone();

        poller.start(
            id,
            move || {
                let client = client.clone();
                async move { client.xray().get(id).await }
            },
            options,
            on_complete,
        )
    }
}
