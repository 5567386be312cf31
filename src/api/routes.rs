//! API route configuration.
//!
//! Routes under `/api` sit behind the pipeline's auth gate; routes under the
//! internal `/api/_` prefix are exempt (the gate skips that sub-prefix).

use axum::{Router, routing::get};
use serde_json::json;

use crate::api::handlers::{health_handler, verify_handler};
use crate::error::AppError;
use crate::state::AppState;

/// Protected API routes (bearer token required).
///
/// # Endpoints
///
/// - `GET /verify` - check collector configuration, emit a test event
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/verify", get(verify_handler))
        .fallback(unknown_api_route)
}

/// Internal introspection routes, exempt from authentication.
///
/// # Endpoints
///
/// - `GET /health` - component health checks
pub fn internal_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_handler))
}

/// JSON 404 for unknown API paths, instead of the plain-text router default.
async fn unknown_api_route(uri: axum::http::Uri) -> AppError {
    AppError::not_found("Unknown API route", json!({ "path": uri.path() }))
}
