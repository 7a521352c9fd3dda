//! Keyword severity suggestion.

use axum::Json;
use serde::{Deserialize, Serialize};

use crowdalert_core::classify::classify_severity;
use crowdalert_core::report::Severity;

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    pub severity: Severity,
}

/// POST /api/severity
pub async fn classify(Json(input): Json<ClassifyRequest>) -> Json<ClassifyResponse> {
    Json(ClassifyResponse {
        severity: classify_severity(&input.description),
    })
}
