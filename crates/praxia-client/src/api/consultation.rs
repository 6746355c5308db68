//! Symptom consultation endpoints.

use tracing::instrument;

use praxia_core::Result;
use praxia_core::models::{ConsultationRequest, MedicalConsultation};

use crate::client::ApiClient;
use crate::endpoints;
use crate::request::ApiRequest;

#[derive(Debug, Clone, Copy)]
pub struct ConsultationApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ConsultationApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<MedicalConsultation>> {
        self.client
            .request(ApiRequest::get(endpoints::CONSULTATIONS))
            .await
    }

    /// Ask for a diagnosis. Unsupported languages fall back to English.
    #[instrument(skip(self, symptoms))]
    pub async fn create(&self, symptoms: &str, language: Option<&str>) -> Result<MedicalConsultation> {
        let body = ConsultationRequest::new(symptoms, language);
        let request = ApiRequest::post(endpoints::CONSULTATIONS).json(&body)?;
        self.client.request(request).await
    }
}
