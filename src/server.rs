//! HTTP server initialization and runtime setup.
//!
//! Handles link store connection, collector setup, delivery worker spawning,
//! and the Axum server lifecycle including the shutdown drain of queued
//! analytics events.

use crate::config::Config;
use crate::domain::event_worker::run_event_worker;
use crate::infrastructure::collector::Ga4Collector;
use crate::infrastructure::store::{LinkRepository, MemoryLinkRepository, RedisLinkRepository};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Redis link store (or an empty in-memory store when unconfigured)
/// - Analytics collector and its background delivery worker
/// - Axum HTTP server with graceful shutdown
///
/// After the listener stops, the delivery worker is joined so every queued
/// analytics event is delivered before the process exits.
///
/// # Errors
///
/// Returns an error if the link store connection, server bind, or server
/// runtime fails.
pub async fn run(config: Config) -> Result<()> {
    let config = Arc::new(config);

    let backing: Arc<dyn LinkRepository> = match &config.redis_url {
        Some(redis_url) => {
            let repo = RedisLinkRepository::connect(redis_url)
                .await
                .context("Failed to connect to the link store")?;
            Arc::new(repo)
        }
        None => {
            tracing::warn!("REDIS_URL not set; using an empty in-memory store, no slug will resolve");
            Arc::new(MemoryLinkRepository::new())
        }
    };

    let collector = Ga4Collector::from_config(&config)
        .context("Failed to build the analytics collector")?
        .map(Arc::new);

    let (event_tx, event_rx) = mpsc::channel(config.event_queue_capacity);

    let worker = collector.as_ref().map(|collector| {
        tracing::info!("Analytics delivery worker started");
        tokio::spawn(run_event_worker(event_rx, collector.clone()))
    });

    let state = AppState::new(config.clone(), backing, collector, event_tx);

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // Dropping the router dropped every event sender; once the worker drains
    // what is already queued, recv() ends and the join completes.
    if let Some(worker) = worker {
        tracing::info!("Draining analytics event queue");
        let _ = worker.await;
    }

    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
