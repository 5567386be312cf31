//! Handler for the internal health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /api/_/health` - under the internal prefix, so no credential is
/// required.
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Components Checked
///
/// 1. **Link store**: backend ping
/// 2. **Event queue**: channel open, remaining capacity
/// 3. **Collector**: configured or deliberately disabled
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let store_check = check_store(&state).await;
    let queue_check = check_event_queue(&state);
    let collector_check = check_collector(&state);

    let all_healthy = store_check.status == "ok"
        && queue_check.status == "ok"
        && collector_check.status != "error";

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            link_store: store_check,
            event_queue: queue_check,
            collector: collector_check,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

/// Checks link store connectivity.
async fn check_store(state: &AppState) -> CheckStatus {
    if state.store.healthy().await {
        CheckStatus {
            status: "ok".to_string(),
            message: Some("Link store reachable".to_string()),
        }
    } else {
        CheckStatus {
            status: "error".to_string(),
            message: Some("Link store unreachable".to_string()),
        }
    }
}

/// Checks if the analytics event queue is operational.
fn check_event_queue(state: &AppState) -> CheckStatus {
    if state.event_sender.is_closed() {
        CheckStatus {
            status: "error".to_string(),
            message: Some("Event queue is closed".to_string()),
        }
    } else {
        CheckStatus {
            status: "ok".to_string(),
            message: Some(format!("Capacity: {}", state.event_sender.capacity())),
        }
    }
}

/// Reports collector configuration state.
fn check_collector(state: &AppState) -> CheckStatus {
    match state.collector {
        Some(_) => CheckStatus {
            status: "ok".to_string(),
            message: Some("Collector configured".to_string()),
        },
        None => CheckStatus {
            status: "disabled".to_string(),
            message: Some("Collector not configured".to_string()),
        },
    }
}
