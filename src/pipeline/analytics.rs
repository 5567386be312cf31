//! Analytics dispatch for resolved redirects.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use super::{RequestContext, Stage, StageOutcome};
use crate::config::Config;
use crate::domain::redirect_event::RedirectEvent;
use crate::error::AppError;
use crate::infrastructure::collector::Ga4Collector;

/// Third pipeline stage: records the redirect without delaying it.
///
/// Runs only when the resolver populated the context with a link; otherwise
/// there is nothing to record. Dispatch never fails the request - every
/// failure mode degrades to a diagnostic flag and a log line.
///
/// The happy path enqueues the event on the bounded delivery queue and
/// returns immediately; the queue's worker outlives the response and is
/// joined on shutdown, which is what makes the fire-and-forget safe. When
/// the queue cannot accept the event (full, or no worker is running) the
/// stage awaits the collector call inline before returning, trading latency
/// for the delivery guarantee.
pub struct AnalyticsDispatcher {
    config: Arc<Config>,
    collector: Option<Arc<Ga4Collector>>,
    sender: mpsc::Sender<RedirectEvent>,
}

impl AnalyticsDispatcher {
    pub fn new(
        config: Arc<Config>,
        collector: Option<Arc<Ga4Collector>>,
        sender: mpsc::Sender<RedirectEvent>,
    ) -> Self {
        Self {
            config,
            collector,
            sender,
        }
    }

    fn build_event(ctx: &RequestContext) -> Option<RedirectEvent> {
        let link = ctx.link()?;
        let slug = ctx.slug.clone()?;

        Some(RedirectEvent {
            client_id: ctx.client_id.clone(),
            user_agent: ctx.user_agent.clone().unwrap_or_default(),
            slug,
            destination: link.url.clone(),
            referrer: ctx.referer.clone().unwrap_or_default(),
            host: ctx.host.clone().unwrap_or_default(),
            timestamp: Utc::now(),
        })
    }
}

#[async_trait]
impl Stage for AnalyticsDispatcher {
    fn name(&self) -> &'static str {
        "analytics-dispatcher"
    }

    async fn run(&self, ctx: &mut RequestContext) -> Result<StageOutcome, AppError> {
        if ctx.link().is_none() {
            return Ok(StageOutcome::Continue);
        }

        let Some(collector) = &self.collector else {
            if self.config.ga_measurement_id.is_none() {
                ctx.flag("missing-measurement-id");
            }
            if self.config.ga_api_secret.is_none() {
                ctx.flag("missing-api-secret");
            }
            return Ok(StageOutcome::Continue);
        };

        let Some(event) = Self::build_event(ctx) else {
            return Ok(StageOutcome::Continue);
        };

        match self.sender.try_send(event) {
            Ok(()) => {
                debug!(path = %ctx.raw_path, "analytics event queued");
                metrics::counter!("analytics_events_queued_total").increment(1);
                ctx.flag("analytics-queued");
            }
            Err(TrySendError::Full(event)) | Err(TrySendError::Closed(event)) => {
                // No queue to hand off to - deliver before returning so the
                // event cannot be lost with the response already sent.
                match collector.send(&event).await {
                    Ok(()) => {
                        debug!(slug = %event.slug, "analytics event sent inline");
                        ctx.flag("analytics-sent");
                    }
                    Err(e) => {
                        warn!(slug = %event.slug, "inline analytics dispatch failed: {}", e);
                        metrics::counter!("analytics_events_dropped_total").increment(1);
                        ctx.flag("fetch-failed");
                    }
                }
            }
        }

        Ok(StageOutcome::Continue)
    }
}
