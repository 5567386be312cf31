//! Handler for collector configuration verification.

use axum::{Json, extract::State};
use tracing::warn;

use crate::api::dto::verify::{VerifyConfig, VerifyResponse};
use crate::state::AppState;

/// Verifies the analytics collector configuration end to end.
///
/// # Endpoint
///
/// `GET /api/verify` (bearer token required)
///
/// Reports missing configuration without touching the network; with a
/// configured collector, emits a throwaway test event and reports whether
/// the collector accepted it. Always responds 200 - the JSON body carries
/// the verdict, so dashboards can render the details instead of a bare
/// error page.
pub async fn verify_handler(State(state): State<AppState>) -> Json<VerifyResponse> {
    let Some(collector) = &state.collector else {
        let mut errors = Vec::new();
        if state.config.ga_measurement_id.is_none() {
            errors.push("Missing GA_MEASUREMENT_ID environment variable".to_string());
        }
        if state.config.ga_api_secret.is_none() {
            errors.push("Missing GA_API_SECRET environment variable".to_string());
        }

        return Json(VerifyResponse {
            success: false,
            message: "Analytics configuration is incomplete".to_string(),
            status: None,
            errors,
            config: None,
        });
    };

    let config_summary = VerifyConfig {
        measurement_id: collector.measurement_id().to_string(),
        api_secret_configured: true,
        domain_configured: state.config.domain_name.is_some(),
    };

    match collector.send_test().await {
        Ok(status) if status.is_success() => Json(VerifyResponse {
            success: true,
            message: "Successfully sent test event to the collector".to_string(),
            status: Some(status.as_u16()),
            errors: Vec::new(),
            config: Some(config_summary),
        }),
        Ok(status) => Json(VerifyResponse {
            success: false,
            message: "Collector rejected the test event; check the measurement id and API secret"
                .to_string(),
            status: Some(status.as_u16()),
            errors: Vec::new(),
            config: Some(config_summary),
        }),
        Err(e) => {
            warn!("collector verification failed: {}", e);
            Json(VerifyResponse {
                success: false,
                message: format!("Error reaching the collector: {}", e),
                status: None,
                errors: Vec::new(),
                config: Some(config_summary),
            })
        }
    }
}
