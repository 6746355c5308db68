//! Medical consultation bodies.

use serde::{Deserialize, Serialize};

use super::Language;

/// A symptom consultation and the backend's answer.
#[derive(Debug, Clone, Deserialize)]
pub struct MedicalConsultation {
    pub id: i64,
    pub symptoms: String,
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub created_at: String,
}

/// Request body for `consultations/`.
#[derive(Debug, Clone, Serialize)]
pub struct ConsultationRequest {
    pub symptoms: String,
    pub language: Language,
}

impl ConsultationRequest {
    /// Build a request, coercing unsupported language codes to English.
    pub fn new(symptoms: impl Into<String>, language: Option<&str>) -> Self {
        Self {
            symptoms: symptoms.into(),
            language: Language::normalize(language),
        }
    }
}
