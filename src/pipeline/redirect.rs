//! Redirect decision: bare 3xx or tracking interstitial.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use async_trait::async_trait;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;

use super::{RequestContext, Stage, StageOutcome};
use crate::config::Config;
use crate::error::AppError;
use crate::utils::target_url::merge_query;

/// Interstitial page shown when client-side tracking needs a real page
/// context: bootstraps the tag manager container, pushes a page-view event,
/// and navigates to the target after a short delay.
#[derive(Template, WebTemplate)]
#[template(path = "interstitial.html")]
struct InterstitialPage {
    slug: String,
    target: String,
    /// JSON-encoded target, safe to embed inside the inline script.
    target_json: String,
    container_id: String,
    delay_ms: u64,
}

/// Final pipeline stage: builds the response for a resolved link.
///
/// The target is the stored destination, with the inbound query string
/// merged in only when query forwarding is enabled. Which response shape the
/// target gets is an explicit configuration decision: the interstitial
/// requires both the interstitial switch and a tag-manager container id;
/// anything else is a direct redirect with the configured status code.
///
/// Requests without a resolved link pass through untouched (the router's
/// 404 is the not-found answer).
pub struct RedirectDecisionEngine {
    config: Arc<Config>,
}

impl RedirectDecisionEngine {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    fn wants_interstitial(&self) -> bool {
        self.config.tracking_interstitial && self.config.gtm_container_id.is_some()
    }

    fn status_code(&self) -> StatusCode {
        // Validated at startup; the fallback can only matter if validation
        // is bypassed in tests.
        StatusCode::from_u16(self.config.redirect_status_code)
            .unwrap_or(StatusCode::MOVED_PERMANENTLY)
    }
}

#[async_trait]
impl Stage for RedirectDecisionEngine {
    fn name(&self) -> &'static str {
        "redirect-decision"
    }

    async fn run(&self, ctx: &mut RequestContext) -> Result<StageOutcome, AppError> {
        let Some(link) = ctx.link() else {
            return Ok(StageOutcome::Continue);
        };

        let target = if self.config.redirect_with_query {
            merge_query(&link.url, ctx.query.as_deref())
        } else {
            link.url.clone()
        };

        if self.wants_interstitial() {
            ctx.flag("redirect-interstitial");
            metrics::counter!("redirects_total", "mode" => "interstitial").increment(1);

            let page = InterstitialPage {
                slug: ctx.slug.clone().unwrap_or_default(),
                target_json: json_for_script(&target),
                target,
                container_id: self
                    .config
                    .gtm_container_id
                    .clone()
                    .unwrap_or_default(),
                delay_ms: self.config.interstitial_delay_ms,
            };

            return Ok(StageOutcome::Respond(page.into_response()));
        }

        ctx.flag("redirect-direct");
        metrics::counter!("redirects_total", "mode" => "direct").increment(1);

        let response =
            (self.status_code(), [(header::LOCATION, target)], ()).into_response();

        Ok(StageOutcome::Respond(response))
    }
}

/// JSON-encodes a string for embedding in an inline `<script>` block.
///
/// `<` is escaped so a crafted destination can never close the script
/// element early.
fn json_for_script(value: &str) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace('<', "\\u003c")
}
