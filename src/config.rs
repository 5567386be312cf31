//! Application configuration loaded from environment variables.
//!
//! Configuration is loaded once at startup and validated before the server
//! starts. The resulting [`Config`] is immutable and shared by reference with
//! every pipeline stage.
//!
//! ## Required Variables
//!
//! - `SITE_TOKEN` - shared secret for the protected API routes (min 8 chars)
//!
//! ## Optional Variables
//!
//! - `REDIS_URL` - link store connection; without it the service starts with
//!   an empty in-memory store and no slug will resolve
//! - `LISTEN` - bind address (default: `0.0.0.0:3000`)
//! - `RUST_LOG` - log level (default: `info`)
//! - `LOG_FORMAT` - log format: `text` or `json` (default: `text`)
//! - `HOME_URL` - where `/` redirects to, if anywhere
//! - `DOMAIN_NAME` - public hostname used in analytics page locations
//! - `GA_MEASUREMENT_ID` / `GA_API_SECRET` - Measurement Protocol collector
//!   credentials; both must be set for server-side analytics
//! - `COLLECTOR_ENDPOINT` - collector URL override
//! - `GTM_CONTAINER_ID` - tag manager container for the interstitial page
//! - `TRACKING_INTERSTITIAL` - serve the interstitial when a container is
//!   configured (default: true)
//! - `INTERSTITIAL_DELAY_MS` - navigation delay on the interstitial (default: 100)
//! - `CASE_SENSITIVE` - slug lookups keep their casing (default: false)
//! - `REDIRECT_WITH_QUERY` - forward the inbound query string (default: false)
//! - `REDIRECT_STATUS_CODE` - 301, 302, 307 or 308 (default: 301)
//! - `LINK_CACHE_TTL` - in-process cache TTL in seconds (default: 60)
//! - `RESERVED_SLUGS` - comma-separated override of the reserved set
//! - `SLUG_PATTERN` - regex a slug must match to be looked up
//! - `ANALYTICS_TIMEOUT_SECONDS` - outbound collector timeout (default: 5)
//! - `EVENT_QUEUE_CAPACITY` - analytics event buffer size (default: 10000, min: 100)

use anyhow::{Context, Result};
use regex::Regex;
use std::env;

const DEFAULT_SLUG_PATTERN: &str = "^[a-zA-Z0-9]+(?:[-_][a-zA-Z0-9]+)*$";

const DEFAULT_RESERVED_SLUGS: &[&str] = &[
    "api",
    "dashboard",
    "static",
    "assets",
    "health",
    "login",
    "favicon.ico",
    "robots.txt",
    "sitemap.xml",
];

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub redis_url: Option<String>,
    pub listen_addr: String,
    pub log_level: String,
    pub log_format: String,
    /// Shared secret compared against `Authorization: Bearer` on API routes.
    pub site_token: String,
    /// Where `GET /` redirects, when set.
    pub home_url: Option<String>,
    /// Public hostname used as the serving-host fallback in analytics events.
    pub domain_name: Option<String>,
    pub ga_measurement_id: Option<String>,
    pub ga_api_secret: Option<String>,
    /// Measurement Protocol endpoint; overridable for self-hosted collectors.
    pub collector_endpoint: String,
    pub gtm_container_id: Option<String>,
    /// When true and a container id is set, redirects render the tracking
    /// interstitial instead of a bare 3xx.
    pub tracking_interstitial: bool,
    pub interstitial_delay_ms: u64,
    /// When false, lookup keys are lower-cased and mixed-case slugs are
    /// retried with their original casing on a miss.
    pub case_sensitive: bool,
    pub redirect_with_query: bool,
    pub redirect_status_code: u16,
    /// TTL (seconds) for in-process cached link records.
    pub link_cache_ttl: u64,
    pub reserved_slugs: Vec<String>,
    pub slug_pattern: Regex,
    pub analytics_timeout_seconds: u64,
    pub event_queue_capacity: usize,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `SITE_TOKEN` is missing or `SLUG_PATTERN` does not
    /// compile.
    pub fn from_env() -> Result<Self> {
        let redis_url = env::var("REDIS_URL").ok();

        let listen_addr = env::var("LISTEN").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

        let site_token = env::var("SITE_TOKEN").context("SITE_TOKEN must be set")?;

        let home_url = env::var("HOME_URL").ok().filter(|v| !v.is_empty());
        let domain_name = env::var("DOMAIN_NAME").ok().filter(|v| !v.is_empty());

        let ga_measurement_id = env::var("GA_MEASUREMENT_ID").ok().filter(|v| !v.is_empty());
        let ga_api_secret = env::var("GA_API_SECRET").ok().filter(|v| !v.is_empty());

        let collector_endpoint = env::var("COLLECTOR_ENDPOINT")
            .unwrap_or_else(|_| "https://www.google-analytics.com/mp/collect".to_string());

        let gtm_container_id = env::var("GTM_CONTAINER_ID").ok().filter(|v| !v.is_empty());

        let tracking_interstitial = env_bool("TRACKING_INTERSTITIAL", true);
        let interstitial_delay_ms = env_parse("INTERSTITIAL_DELAY_MS", 100);

        let case_sensitive = env_bool("CASE_SENSITIVE", false);
        let redirect_with_query = env_bool("REDIRECT_WITH_QUERY", false);
        let redirect_status_code = env_parse("REDIRECT_STATUS_CODE", 301);

        let link_cache_ttl = env_parse("LINK_CACHE_TTL", 60);

        let reserved_slugs = match env::var("RESERVED_SLUGS") {
            Ok(raw) => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Err(_) => DEFAULT_RESERVED_SLUGS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        };

        let slug_pattern_raw =
            env::var("SLUG_PATTERN").unwrap_or_else(|_| DEFAULT_SLUG_PATTERN.to_string());
        let slug_pattern = Regex::new(&slug_pattern_raw)
            .with_context(|| format!("SLUG_PATTERN is not a valid regex: '{slug_pattern_raw}'"))?;

        let analytics_timeout_seconds = env_parse("ANALYTICS_TIMEOUT_SECONDS", 5);
        let event_queue_capacity = env_parse("EVENT_QUEUE_CAPACITY", 10_000);

        Ok(Self {
            redis_url,
            listen_addr,
            log_level,
            log_format,
            site_token,
            home_url,
            domain_name,
            ga_measurement_id,
            ga_api_secret,
            collector_endpoint,
            gtm_container_id,
            tracking_interstitial,
            interstitial_delay_ms,
            case_sensitive,
            redirect_with_query,
            redirect_status_code,
            link_cache_ttl,
            reserved_slugs,
            slug_pattern,
            analytics_timeout_seconds,
            event_queue_capacity,
        })
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `SITE_TOKEN` is shorter than the minimum the auth gate accepts
    /// - `REDIRECT_STATUS_CODE` is not a redirect code
    /// - `LOG_FORMAT` is not `text` or `json`
    /// - queue, TTL or timeout bounds are violated
    pub fn validate(&self) -> Result<()> {
        // Tokens below the gate's minimum length could never authenticate.
        if self.site_token.len() < 8 {
            anyhow::bail!(
                "SITE_TOKEN must be at least 8 characters, got {}",
                self.site_token.len()
            );
        }

        if !matches!(self.redirect_status_code, 301 | 302 | 307 | 308) {
            anyhow::bail!(
                "REDIRECT_STATUS_CODE must be one of 301, 302, 307, 308, got {}",
                self.redirect_status_code
            );
        }

        if self.log_format != "text" && self.log_format != "json" {
            anyhow::bail!(
                "LOG_FORMAT must be 'text' or 'json', got '{}'",
                self.log_format
            );
        }

        if !self.listen_addr.contains(':') {
            anyhow::bail!(
                "LISTEN must be in format 'host:port', got '{}'",
                self.listen_addr
            );
        }

        if let Some(ref redis_url) = self.redis_url
            && !redis_url.starts_with("redis://")
            && !redis_url.starts_with("rediss://")
        {
            anyhow::bail!(
                "REDIS_URL must start with 'redis://' or 'rediss://', got '{}'",
                redis_url
            );
        }

        if self.link_cache_ttl == 0 {
            anyhow::bail!("LINK_CACHE_TTL must be greater than 0");
        }

        if self.event_queue_capacity < 100 {
            anyhow::bail!(
                "EVENT_QUEUE_CAPACITY must be at least 100, got {}",
                self.event_queue_capacity
            );
        }

        if self.event_queue_capacity > 1_000_000 {
            anyhow::bail!(
                "EVENT_QUEUE_CAPACITY is too large (max: 1000000), got {}",
                self.event_queue_capacity
            );
        }

        if self.analytics_timeout_seconds == 0 || self.analytics_timeout_seconds > 60 {
            anyhow::bail!(
                "ANALYTICS_TIMEOUT_SECONDS must be between 1 and 60, got {}",
                self.analytics_timeout_seconds
            );
        }

        Ok(())
    }

    /// Returns whether the server-side collector is fully configured.
    pub fn is_collector_configured(&self) -> bool {
        self.ga_measurement_id.is_some() && self.ga_api_secret.is_some()
    }

    /// Prints configuration summary (without sensitive data).
    pub fn print_summary(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Listen address: {}", self.listen_addr);

        match self.redis_url {
            Some(ref url) => tracing::info!("  Link store: {}", mask_connection_string(url)),
            None => tracing::info!("  Link store: in-memory (no REDIS_URL)"),
        }

        tracing::info!(
            "  Collector: {}",
            if self.is_collector_configured() {
                "configured"
            } else {
                "disabled"
            }
        );
        tracing::info!(
            "  Interstitial: {}",
            if self.tracking_interstitial && self.gtm_container_id.is_some() {
                "enabled"
            } else {
                "disabled"
            }
        );
        tracing::info!("  Case sensitive slugs: {}", self.case_sensitive);
        tracing::info!("  Redirect status: {}", self.redirect_status_code);
        tracing::info!("  Link cache TTL: {}s", self.link_cache_ttl);
        tracing::info!("  Log level: {}", self.log_level);
        tracing::info!("  Log format: {}", self.log_format);
        tracing::info!("  Event queue capacity: {}", self.event_queue_capacity);
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Masks sensitive information in connection strings for logging.
///
/// Replaces password with `***` in URLs like:
/// - `redis://:password@host:port/db` → `redis://:***@host:port/db`
fn mask_connection_string(url: &str) -> String {
    if let Some(start) = url.find("://") {
        let scheme_end = start + 3;
        let rest = &url[scheme_end..];

        if let Some(at_pos) = rest.find('@') {
            let credentials = &rest[..at_pos];
            let host_part = &rest[at_pos..];

            if let Some(colon_pos) = credentials.rfind(':') {
                let username = &credentials[..colon_pos];
                return format!("{}://{}:***{}", &url[..start], username, host_part);
            }
        }
    }

    url.to_string()
}

/// Loads and validates configuration from environment variables.
///
/// # Errors
///
/// Returns an error if required variables are missing or validation fails.
///
/// # Note
///
/// This function expects environment variables to be already loaded
/// (e.g., via `dotenvy::dotenv()` in `main.rs`).
pub fn load_from_env() -> Result<Config> {
    let config = Config::from_env()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn base_config() -> Config {
        Config {
            redis_url: None,
            listen_addr: "0.0.0.0:3000".to_string(),
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            site_token: "super-secret-token".to_string(),
            home_url: None,
            domain_name: None,
            ga_measurement_id: None,
            ga_api_secret: None,
            collector_endpoint: "https://www.google-analytics.com/mp/collect".to_string(),
            gtm_container_id: None,
            tracking_interstitial: true,
            interstitial_delay_ms: 100,
            case_sensitive: false,
            redirect_with_query: false,
            redirect_status_code: 301,
            link_cache_ttl: 60,
            reserved_slugs: DEFAULT_RESERVED_SLUGS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            slug_pattern: Regex::new(DEFAULT_SLUG_PATTERN).unwrap(),
            analytics_timeout_seconds: 5,
            event_queue_capacity: 10_000,
        }
    }

    #[test]
    fn test_mask_connection_string() {
        assert_eq!(
            mask_connection_string("redis://:password@localhost:6379/0"),
            "redis://:***@localhost:6379/0"
        );

        assert_eq!(
            mask_connection_string("redis://localhost:6379/0"),
            "redis://localhost:6379/0"
        );
    }

    #[test]
    fn test_config_validation() {
        let mut config = base_config();
        assert!(config.validate().is_ok());

        config.site_token = "short".to_string();
        assert!(config.validate().is_err());
        config.site_token = "super-secret-token".to_string();

        config.redirect_status_code = 200;
        assert!(config.validate().is_err());
        config.redirect_status_code = 308;
        assert!(config.validate().is_ok());

        config.log_format = "invalid".to_string();
        assert!(config.validate().is_err());
        config.log_format = "json".to_string();
        assert!(config.validate().is_ok());

        config.event_queue_capacity = 50;
        assert!(config.validate().is_err());
        config.event_queue_capacity = 10_000;

        config.redis_url = Some("mysql://localhost".to_string());
        assert!(config.validate().is_err());
        config.redis_url = Some("redis://localhost:6379/0".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_slug_pattern() {
        let pattern = Regex::new(DEFAULT_SLUG_PATTERN).unwrap();

        assert!(pattern.is_match("promo"));
        assert!(pattern.is_match("PROMO"));
        assert!(pattern.is_match("summer-sale_2024"));
        assert!(!pattern.is_match(""));
        assert!(!pattern.is_match("a/b"));
        assert!(!pattern.is_match("favicon.ico"));
        assert!(!pattern.is_match("-leading"));
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        // SAFETY: Tests are run serially due to #[serial], so no concurrent access
        unsafe {
            env::set_var("SITE_TOKEN", "super-secret-token");
            env::remove_var("REDIS_URL");
            env::remove_var("RESERVED_SLUGS");
            env::remove_var("CASE_SENSITIVE");
            env::remove_var("REDIRECT_STATUS_CODE");
        }

        let config = Config::from_env().unwrap();

        assert!(config.redis_url.is_none());
        assert!(!config.case_sensitive);
        assert!(!config.redirect_with_query);
        assert_eq!(config.redirect_status_code, 301);
        assert_eq!(config.link_cache_ttl, 60);
        assert!(config.reserved_slugs.iter().any(|s| s == "api"));

        unsafe {
            env::remove_var("SITE_TOKEN");
        }
    }

    #[test]
    #[serial]
    fn test_reserved_slugs_override() {
        // SAFETY: Tests are run serially due to #[serial], so no concurrent access
        unsafe {
            env::set_var("SITE_TOKEN", "super-secret-token");
            env::set_var("RESERVED_SLUGS", "one, two ,three,");
        }

        let config = Config::from_env().unwrap();
        assert_eq!(config.reserved_slugs, vec!["one", "two", "three"]);

        unsafe {
            env::remove_var("SITE_TOKEN");
            env::remove_var("RESERVED_SLUGS");
        }
    }

    #[test]
    #[serial]
    fn test_missing_site_token_fails() {
        // SAFETY: Tests are run serially due to #[serial], so no concurrent access
        unsafe {
            env::remove_var("SITE_TOKEN");
        }

        assert!(Config::from_env().is_err());
    }
}
