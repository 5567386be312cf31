//! GA4 Measurement Protocol client.

use std::time::Duration;

use serde_json::{Value, json};
use tracing::warn;

use crate::config::Config;
use crate::domain::redirect_event::RedirectEvent;

/// Errors from the outbound collector call.
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("collector request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("collector returned status {0}")]
    Status(reqwest::StatusCode),
}

/// Measurement Protocol client for redirect analytics.
///
/// Posts event batches to the collector endpoint, parameterized by the
/// measurement id and API secret. The HTTP client carries a bounded timeout
/// so a slow collector can never pile up outbound calls under load.
pub struct Ga4Collector {
    http: reqwest::Client,
    endpoint: String,
    measurement_id: String,
    api_secret: String,
    /// Serving-host fallback when the request carried no Host header.
    domain_name: String,
}

impl Ga4Collector {
    /// Builds a collector from configuration.
    ///
    /// Returns `Ok(None)` when the measurement id or API secret is missing,
    /// logging which piece is absent - the service then runs with
    /// server-side analytics disabled.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::Transport`] if the HTTP client cannot be
    /// constructed.
    pub fn from_config(config: &Config) -> Result<Option<Self>, CollectorError> {
        let (measurement_id, api_secret) =
            match (&config.ga_measurement_id, &config.ga_api_secret) {
                (Some(id), Some(secret)) => (id.clone(), secret.clone()),
                (None, _) => {
                    warn!("Analytics collector disabled: missing GA_MEASUREMENT_ID");
                    return Ok(None);
                }
                (_, None) => {
                    warn!("Analytics collector disabled: missing GA_API_SECRET");
                    return Ok(None);
                }
            };

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.analytics_timeout_seconds))
            .build()?;

        Ok(Some(Self {
            http,
            endpoint: config.collector_endpoint.clone(),
            measurement_id,
            api_secret,
            domain_name: config
                .domain_name
                .clone()
                .unwrap_or_else(|| "localhost:3000".to_string()),
        }))
    }

    /// Builds the Measurement Protocol batch for one redirect.
    ///
    /// Carries a standard `page_view`, a `link_click`, and a `redirect`
    /// event; the last one holds the full redirect detail (slug,
    /// destination, serving domain, referrer, server timestamp).
    fn payload(&self, event: &RedirectEvent) -> Value {
        let serving_domain = if event.host.is_empty() {
            self.domain_name.as_str()
        } else {
            event.host.as_str()
        };

        json!({
            "client_id": event.client_id,
            "user_agent": event.user_agent,
            "events": [
                {
                    "name": "page_view",
                    "params": {
                        "page_title": format!("Redirect: {}", event.slug),
                        "page_location": format!("https://{}/{}", self.domain_name, event.slug),
                        "page_path": format!("/{}", event.slug),
                    },
                },
                {
                    "name": "link_click",
                    "params": {
                        "slug": event.slug,
                        "destination": event.destination,
                        "referrer": event.referrer,
                    },
                },
                {
                    "name": "redirect",
                    "params": {
                        "slug": event.slug,
                        "destination": event.destination,
                        "domain": serving_domain,
                        "referrer": event.referrer,
                        "user_agent": event.user_agent,
                        "timestamp": event.timestamp.to_rfc3339(),
                    },
                },
            ],
        })
    }

    async fn post(&self, body: &Value) -> Result<reqwest::StatusCode, CollectorError> {
        let response = self
            .http
            .post(&self.endpoint)
            .query(&[
                ("measurement_id", self.measurement_id.as_str()),
                ("api_secret", self.api_secret.as_str()),
            ])
            .json(body)
            .send()
            .await?;

        Ok(response.status())
    }

    /// Sends one redirect event batch.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::Transport`] on network failure or timeout
    /// and [`CollectorError::Status`] on a non-2xx collector response.
    pub async fn send(&self, event: &RedirectEvent) -> Result<(), CollectorError> {
        let status = self.post(&self.payload(event)).await?;

        if status.is_success() {
            Ok(())
        } else {
            Err(CollectorError::Status(status))
        }
    }

    /// Sends a throwaway test event, for configuration verification.
    ///
    /// Returns the collector's status code; the caller decides what a
    /// non-2xx means.
    pub async fn send_test(&self) -> Result<reqwest::StatusCode, CollectorError> {
        let body = json!({
            "client_id": "verification",
            "events": [{
                "name": "test_event",
                "params": {
                    "test_param": "verification_test",
                    "timestamp": chrono::Utc::now().to_rfc3339(),
                },
            }],
        });

        self.post(&body).await
    }

    pub fn measurement_id(&self) -> &str {
        &self.measurement_id
    }
}
