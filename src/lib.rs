//! # Linkgate
//!
//! A slug-to-URL redirect gateway with server-side analytics, built with
//! Axum and Redis.
//!
//! ## Architecture
//!
//! Every inbound request runs through an explicit, ordered pipeline before
//! it can reach a route:
//!
//! 1. **Auth gate** - bearer-token check for the protected `/api` routes
//! 2. **Slug resolver** - reserved/pattern gate, cache-backed store lookup
//!    with a case-sensitivity fallback
//! 3. **Analytics dispatcher** - queues a redirect event for background
//!    delivery, with a synchronous fallback when the queue is unavailable
//! 4. **Redirect decision** - direct 3xx or a tracking interstitial
//!
//! Layers:
//!
//! - **Domain Layer** ([`domain`]) - link records and analytics events
//! - **Pipeline Layer** ([`pipeline`]) - the stage chain and per-request context
//! - **Infrastructure Layer** ([`infrastructure`]) - Redis link store,
//!   in-process cache, and the Measurement Protocol collector
//! - **API Layer** ([`api`]) - verification and health endpoints
//!
//! ## Features
//!
//! - Read-through TTL caching of link records
//! - Mixed-case slug fallback for links created under a case-sensitive policy
//! - Guaranteed analytics delivery: queued events are drained on shutdown
//! - Direct redirects or a tag-manager interstitial, switchable in config
//! - Diagnostic response headers describing each request's path through
//!   the pipeline
//!
//! ## Quick Start
//!
//! ```bash
//! # Set required environment variables
//! export SITE_TOKEN="change-me-please"
//! export REDIS_URL="redis://localhost:6379"
//!
//! # Start the service
//! cargo run
//! ```
//!
//! ## Configuration
//!
//! Service configuration is loaded from environment variables via
//! [`config::Config`]. See the [`config`] module for available options.

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod pipeline;
pub mod routes;
pub mod server;
pub mod state;
pub mod utils;

pub use error::AppError;
pub use state::AppState;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::domain::entities::LinkRecord;
    pub use crate::domain::redirect_event::RedirectEvent;
    pub use crate::error::AppError;
    pub use crate::pipeline::RequestContext;
    pub use crate::state::AppState;
}
