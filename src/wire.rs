//! JSON bodies exchanged with the inference service.

use serde::{Deserialize, Serialize};

/// Body of a successful `POST /predict`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PredictResponse {
    pub prediction: String,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body of any non-2xx response.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Body of `GET /models/status`.
///
/// The known keys are typed; everything else is kept verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ModelsStatus {
    #[serde(default)]
    pub available_models: Vec<String>,
    #[serde(default)]
    pub missing_models: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_models: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_count: Option<u64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
