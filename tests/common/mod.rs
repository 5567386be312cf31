#![allow(dead_code)]

use std::sync::Arc;

use axum::{Router, middleware};
use linkgate::config::Config;
use linkgate::domain::entities::LinkRecord;
use linkgate::domain::redirect_event::RedirectEvent;
use linkgate::infrastructure::collector::Ga4Collector;
use linkgate::infrastructure::store::MemoryLinkRepository;
use linkgate::pipeline;
use linkgate::state::AppState;
use regex::Regex;
use tokio::sync::mpsc;

pub const TEST_SITE_TOKEN: &str = "test-site-token";

/// Baseline test configuration: in-memory store, case-insensitive slugs,
/// query forwarding off, no collector, no interstitial.
pub fn test_config() -> Config {
    Config {
        redis_url: None,
        listen_addr: "127.0.0.1:0".to_string(),
        log_level: "info".to_string(),
        log_format: "text".to_string(),
        site_token: TEST_SITE_TOKEN.to_string(),
        home_url: None,
        domain_name: Some("go.example.com".to_string()),
        ga_measurement_id: None,
        ga_api_secret: None,
        collector_endpoint: "https://www.google-analytics.com/mp/collect".to_string(),
        gtm_container_id: None,
        tracking_interstitial: true,
        interstitial_delay_ms: 100,
        case_sensitive: false,
        redirect_with_query: false,
        redirect_status_code: 302,
        link_cache_ttl: 60,
        reserved_slugs: vec![
            "api".to_string(),
            "dashboard".to_string(),
            "static".to_string(),
            "health".to_string(),
        ],
        slug_pattern: Regex::new("^[a-zA-Z0-9]+(?:[-_][a-zA-Z0-9]+)*$").unwrap(),
        analytics_timeout_seconds: 5,
        event_queue_capacity: 100,
    }
}

pub struct TestApp {
    pub state: AppState,
    pub repo: Arc<MemoryLinkRepository>,
    pub event_rx: mpsc::Receiver<RedirectEvent>,
}

/// Builds app state over a fresh in-memory store.
///
/// The returned receiver is the analytics queue's consuming end, so tests
/// can assert exactly what got dispatched.
pub fn create_test_state(config: Config) -> TestApp {
    let repo = Arc::new(MemoryLinkRepository::new());
    let (tx, rx) = mpsc::channel(100);

    let state = AppState::new(Arc::new(config), repo.clone(), None, tx);

    TestApp {
        state,
        repo,
        event_rx: rx,
    }
}

/// Like [`create_test_state`], but with the collector built from the config.
///
/// The config must carry `ga_measurement_id` and `ga_api_secret`; point
/// `collector_endpoint` at a local capture server (or an unreachable
/// address) so tests never talk to the real collector.
pub fn create_test_state_with_collector(config: Config) -> TestApp {
    let collector = Ga4Collector::from_config(&config)
        .expect("collector build failed")
        .expect("collector not configured");

    let repo = Arc::new(MemoryLinkRepository::new());
    let (tx, rx) = mpsc::channel(100);

    let state = AppState::new(Arc::new(config), repo.clone(), Some(Arc::new(collector)), tx);

    TestApp {
        state,
        repo,
        event_rx: rx,
    }
}

/// Router mirroring the production layout: API nests wrapped by the
/// pipeline middleware. Rate limiting and tracing layers are left off.
pub fn test_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/_", linkgate::api::routes::internal_routes())
        .nest("/api", linkgate::api::routes::protected_routes())
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(state, pipeline::layer))
}

pub fn seed_link(repo: &MemoryLinkRepository, key: &str, slug: &str, url: &str) {
    repo.insert(key, LinkRecord::new(format!("id-{slug}"), slug, url));
}
