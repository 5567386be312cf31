//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET /{slug}`       - handled by the pipeline before routing
//! - `/api/verify`       - collector verification (bearer token required)
//! - `/api/_/health`     - component health (internal, no token)
//!
//! # Middleware
//!
//! - **Pipeline** - auth gate, slug resolution, analytics, redirect
//! - **Tracing** - structured request/response logging
//! - **Rate limiting** - per-IP token bucket on the API nest
//! - **Path normalization** - trailing slash handling

use axum::{Router, middleware};
use tower::Layer;
use tower_http::LatencyUnit;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::api;
use crate::api::middleware::rate_limit;
use crate::pipeline;
use crate::state::AppState;

/// Constructs the application router with all routes and middleware.
///
/// The pipeline layer wraps the whole router, so it also sees requests no
/// route matches - that is where slug redirects happen; what the pipeline
/// declines falls through to the API routes or the default 404.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    let router = Router::new()
        .nest("/api/_", api::routes::internal_routes())
        .nest(
            "/api",
            api::routes::protected_routes().layer(rate_limit::layer()),
        )
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(state, pipeline::layer))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        );

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
