//! X-ray analysis bodies.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::PollStatus;

/// Literal value of `analysis_result` while inference is still running.
pub const PROCESSING_SENTINEL: &str = "Processing...";

/// An uploaded X-ray and its analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XrayAnalysis {
    pub id: i64,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub analysis_result: String,
    #[serde(default)]
    pub detected_conditions: Map<String, Value>,
    #[serde(default)]
    pub confidence_scores: HashMap<String, f64>,
    #[serde(default)]
    pub created_at: String,
}

impl XrayAnalysis {
    /// Confidence scores sorted from most to least likely.
    pub fn ranked_conditions(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self
            .confidence_scores
            .iter()
            .map(|(name, score)| (name.as_str(), *score))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}

impl PollStatus for XrayAnalysis {
    fn is_processing(&self) -> bool {
        self.analysis_result == PROCESSING_SENTINEL
    }
}
