mod common;

use axum_test::TestServer;
use common::{create_test_state, seed_link, test_config, test_router};

#[tokio::test]
async fn test_redirect_uses_configured_status() {
    let app = create_test_state(test_config());
    seed_link(&app.repo, "promo", "promo", "https://dest.example/x");

    let server = TestServer::new(test_router(app.state)).unwrap();

    let response = server.get("/promo").await;

    assert_eq!(response.status_code(), 302);
    assert_eq!(response.header("location"), "https://dest.example/x");
    let trace = response.header("x-redirect-trace");
    assert!(trace.to_str().unwrap().contains("redirect-direct"));
}

#[tokio::test]
async fn test_unknown_slug_falls_through_to_404() {
    let app = create_test_state(test_config());
    let server = TestServer::new(test_router(app.state)).unwrap();

    let response = server.get("/nothing-here").await;

    response.assert_status_not_found();
    let trace = response.header("x-redirect-trace");
    assert!(trace.to_str().unwrap().contains("link-not-found"));
}

#[tokio::test]
async fn test_reserved_slug_never_queries_the_store() {
    let app = create_test_state(test_config());
    seed_link(&app.repo, "dashboard", "dashboard", "https://dest.example/x");

    let server = TestServer::new(test_router(app.state)).unwrap();

    let response = server.get("/dashboard").await;

    response.assert_status_not_found();
    assert_eq!(app.repo.lookups(), 0);
}

#[tokio::test]
async fn test_invalid_slug_pattern_never_queries_the_store() {
    let app = create_test_state(test_config());
    let server = TestServer::new(test_router(app.state)).unwrap();

    server.get("/favicon.ico").await;
    server.get("/a/b").await;

    assert_eq!(app.repo.lookups(), 0);
}

#[tokio::test]
async fn test_case_insensitive_variants_resolve_to_same_url() {
    let app = create_test_state(test_config());
    seed_link(&app.repo, "promo", "promo", "https://dest.example/x");

    let server = TestServer::new(test_router(app.state)).unwrap();

    for path in ["/promo", "/PROMO", "/pRoMo"] {
        let response = server.get(path).await;
        assert_eq!(response.status_code(), 302, "path {path}");
        assert_eq!(response.header("location"), "https://dest.example/x");
    }
}

#[tokio::test]
async fn test_mixed_case_historical_slug_resolves_via_fallback() {
    let app = create_test_state(test_config());
    // Stored under its original casing only, as links created before the
    // store went case-insensitive are.
    seed_link(&app.repo, "MixedCase", "MixedCase", "https://dest.example/legacy");

    let server = TestServer::new(test_router(app.state)).unwrap();

    let response = server.get("/MixedCase").await;

    assert_eq!(response.status_code(), 302);
    assert_eq!(response.header("location"), "https://dest.example/legacy");
    let trace = response.header("x-redirect-trace");
    assert!(trace.to_str().unwrap().contains("case-fallback"));
    // One miss on the lower-cased key, one hit on the original casing.
    assert_eq!(app.repo.lookups(), 2);
}

#[tokio::test]
async fn test_case_sensitive_mode_skips_fallback() {
    let mut config = test_config();
    config.case_sensitive = true;

    let app = create_test_state(config);
    seed_link(&app.repo, "promo", "promo", "https://dest.example/x");

    let server = TestServer::new(test_router(app.state)).unwrap();

    let response = server.get("/PROMO").await;

    response.assert_status_not_found();
    assert_eq!(app.repo.lookups(), 1);
}

#[tokio::test]
async fn test_query_forwarding_enabled_merges_query() {
    let mut config = test_config();
    config.redirect_with_query = true;

    let app = create_test_state(config);
    seed_link(&app.repo, "abc", "abc", "https://example.com/page");

    let server = TestServer::new(test_router(app.state)).unwrap();

    let response = server.get("/abc").add_query_param("x", "1").await;

    assert_eq!(response.status_code(), 302);
    assert_eq!(response.header("location"), "https://example.com/page?x=1");
}

#[tokio::test]
async fn test_query_forwarding_disabled_keeps_destination() {
    let app = create_test_state(test_config());
    seed_link(&app.repo, "abc", "abc", "https://example.com/page");

    let server = TestServer::new(test_router(app.state)).unwrap();

    let response = server.get("/abc").add_query_param("x", "1").await;

    assert_eq!(response.status_code(), 302);
    assert_eq!(response.header("location"), "https://example.com/page");
}

#[tokio::test]
async fn test_repeated_resolution_within_ttl_hits_backend_once() {
    let app = create_test_state(test_config());
    seed_link(&app.repo, "promo", "promo", "https://dest.example/x");

    let server = TestServer::new(test_router(app.state)).unwrap();

    for _ in 0..3 {
        let response = server.get("/promo").await;
        assert_eq!(response.status_code(), 302);
    }

    assert_eq!(app.repo.lookups(), 1);
}

#[tokio::test]
async fn test_home_redirect_when_configured() {
    let mut config = test_config();
    config.home_url = Some("https://home.example/".to_string());

    let app = create_test_state(config);
    let server = TestServer::new(test_router(app.state)).unwrap();

    let response = server.get("/").await;

    assert_eq!(response.status_code(), 307);
    assert_eq!(response.header("location"), "https://home.example/");
}

#[tokio::test]
async fn test_root_without_home_url_is_404() {
    let app = create_test_state(test_config());
    let server = TestServer::new(test_router(app.state)).unwrap();

    let response = server.get("/").await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn test_interstitial_served_when_container_configured() {
    let mut config = test_config();
    config.gtm_container_id = Some("GTM-ABC123".to_string());
    config.tracking_interstitial = true;

    let app = create_test_state(config);
    seed_link(&app.repo, "promo", "promo", "https://dest.example/x");

    let server = TestServer::new(test_router(app.state)).unwrap();

    let response = server.get("/promo").await;

    assert_eq!(response.status_code(), 200);
    let body = response.text();
    assert!(body.contains("GTM-ABC123"));
    assert!(body.contains("\"https://dest.example/x\""));
    assert!(body.contains("Redirect: promo"));

    let trace = response.header("x-redirect-trace");
    assert!(trace.to_str().unwrap().contains("redirect-interstitial"));
}

#[tokio::test]
async fn test_interstitial_switch_off_forces_direct_redirect() {
    let mut config = test_config();
    config.gtm_container_id = Some("GTM-ABC123".to_string());
    config.tracking_interstitial = false;

    let app = create_test_state(config);
    seed_link(&app.repo, "promo", "promo", "https://dest.example/x");

    let server = TestServer::new(test_router(app.state)).unwrap();

    let response = server.get("/promo").await;

    assert_eq!(response.status_code(), 302);
    assert_eq!(response.header("location"), "https://dest.example/x");
}

#[tokio::test]
async fn test_end_to_end_mixed_case_with_query_forwarding() {
    let mut config = test_config();
    config.redirect_with_query = true;

    let mut app = create_test_state(config);
    seed_link(&app.repo, "promo", "promo", "https://dest.example/x");

    let server = TestServer::new(test_router(app.state)).unwrap();

    let response = server.get("/PROMO").add_query_param("ref", "email").await;

    assert_eq!(response.status_code(), 302);
    assert_eq!(
        response.header("location"),
        "https://dest.example/x?ref=email"
    );

    // No collector configured: the dispatch is skipped, nothing queued, and
    // the redirect is unaffected.
    assert!(app.event_rx.try_recv().is_err());
    let trace = response.header("x-redirect-trace");
    assert!(trace.to_str().unwrap().contains("missing-measurement-id"));
}
