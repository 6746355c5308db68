//! Research query bodies.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A literature research query and its results.
#[derive(Debug, Clone, Deserialize)]
pub struct ResearchQuery {
    pub id: i64,
    pub query: String,
    #[serde(default)]
    pub results: Map<String, Value>,
    #[serde(default)]
    pub created_at: String,
}

/// Request body for `research/`.
#[derive(Debug, Serialize)]
pub struct ResearchRequest<'a> {
    pub query: &'a str,
}
