//! Backend health check bodies.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

/// Response from the public `health/` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub ai_system: String,
    #[serde(default)]
    pub version: String,
}

/// Response from `health/authenticated/`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticatedHealthStatus {
    #[serde(default)]
    pub timestamp: String,
    pub status: String,
    #[serde(default)]
    pub services_status: HashMap<String, String>,
    #[serde(default)]
    pub external_data: Map<String, Value>,
}
