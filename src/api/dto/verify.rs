//! Collector verification response types.

use serde::{Deserialize, Serialize};

/// Outcome of the collector configuration check.
///
/// Always returned with HTTP 200; `success` tells whether a test event
/// reached the collector. Configuration gaps are listed in `errors`.
#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<VerifyConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyConfig {
    pub measurement_id: String,
    pub api_secret_configured: bool,
    pub domain_configured: bool,
}
