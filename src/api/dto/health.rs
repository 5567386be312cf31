//! Health check response types.

use serde::{Deserialize, Serialize};

/// Overall service health with per-component checks.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `"healthy"` or `"degraded"`.
    pub status: String,
    pub version: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthChecks {
    pub link_store: CheckStatus,
    pub event_queue: CheckStatus,
    pub collector: CheckStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckStatus {
    /// `"ok"`, `"disabled"`, or `"error"`.
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
