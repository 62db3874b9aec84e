//! Request and response types for all vg-daemon HTTP endpoints.
//!
//! These types are `Serialize + Deserialize` so they can be JSON-encoded
//! by Axum and decoded by tests.  No business logic lives here.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
}

// ---------------------------------------------------------------------------
// /v1/predict  /v1/predict/form
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub label: u8,
    /// "Visa-approved" | "Visa Not-Approved"
    pub outcome: String,
    pub model_id: Uuid,
}

// ---------------------------------------------------------------------------
// /v1/promote
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoteRequest {
    pub artifact_path: PathBuf,
    pub f1_score: f64,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Body of every non-2xx response produced by a handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Stable code, e.g. "FEATURE_SCHEMA_MISMATCH".
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle_id: Option<Uuid>,
    /// Last cycle state reached, for aborted promotions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}
