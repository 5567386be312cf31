//! Background delivery worker for redirect analytics events.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

use crate::domain::redirect_event::RedirectEvent;
use crate::infrastructure::collector::Ga4Collector;

/// Drains the event channel and delivers each event to the collector.
///
/// Runs until every sender is dropped and the queue is empty, so joining the
/// worker task after server shutdown guarantees queued events are delivered
/// before the process exits.
///
/// Transient delivery failures are retried with jittered exponential backoff
/// (3 attempts total); an event that still fails is logged and dropped. A
/// failed event never propagates anywhere near the request path.
pub async fn run_event_worker(mut rx: mpsc::Receiver<RedirectEvent>, collector: Arc<Ga4Collector>) {
    while let Some(event) = rx.recv().await {
        let strategy = ExponentialBackoff::from_millis(200).map(jitter).take(2);

        match Retry::spawn(strategy, || collector.send(&event)).await {
            Ok(()) => {
                tracing::debug!(slug = %event.slug, "analytics event delivered");
                metrics::counter!("analytics_events_delivered_total").increment(1);
            }
            Err(e) => {
                tracing::warn!(slug = %event.slug, "analytics event dropped: {}", e);
                metrics::counter!("analytics_events_dropped_total").increment(1);
            }
        }
    }

    tracing::debug!("analytics event queue drained");
}
