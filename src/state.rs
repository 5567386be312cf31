//! Shared application state and pipeline wiring.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::Config;
use crate::domain::redirect_event::RedirectEvent;
use crate::infrastructure::collector::Ga4Collector;
use crate::infrastructure::store::{CachedLinkStore, LinkRepository};
use crate::pipeline::analytics::AnalyticsDispatcher;
use crate::pipeline::auth_gate::AuthGate;
use crate::pipeline::redirect::RedirectDecisionEngine;
use crate::pipeline::slug_resolver::SlugResolver;
use crate::pipeline::{Pipeline, Stage};

/// Process-wide shared state, cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<CachedLinkStore>,
    pub collector: Option<Arc<Ga4Collector>>,
    pub event_sender: mpsc::Sender<RedirectEvent>,
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    /// Assembles the state and the request pipeline.
    ///
    /// This is the single place that fixes the stage order: auth gate, slug
    /// resolver, analytics dispatcher, redirect decision. Each stage gets
    /// its collaborators here, by reference, at construction.
    pub fn new(
        config: Arc<Config>,
        backing: Arc<dyn LinkRepository>,
        collector: Option<Arc<Ga4Collector>>,
        event_sender: mpsc::Sender<RedirectEvent>,
    ) -> Self {
        let store = Arc::new(CachedLinkStore::new(backing));

        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(AuthGate::new(config.clone())),
            Box::new(SlugResolver::new(config.clone(), store.clone())),
            Box::new(AnalyticsDispatcher::new(
                config.clone(),
                collector.clone(),
                event_sender.clone(),
            )),
            Box::new(RedirectDecisionEngine::new(config.clone())),
        ];

        Self {
            config,
            store,
            collector,
            event_sender,
            pipeline: Arc::new(Pipeline::new(stages)),
        }
    }
}
