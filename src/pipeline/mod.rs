//! The request pipeline: an explicit, ordered chain of stages.
//!
//! Every inbound request flows through the same fixed sequence - auth gate,
//! slug resolver, analytics dispatch, redirect decision - before it can
//! reach the router. Each stage receives the mutable [`RequestContext`] and
//! either lets the chain continue or short-circuits with a response. A
//! request no stage claims falls through to the inner router (API routes,
//! then the default 404).
//!
//! The ordering lives in one place ([`crate::state::AppState::new`]) as a
//! plain list, so it is visible and testable rather than implied by layer
//! registration order.

mod context;

pub mod analytics;
pub mod auth_gate;
pub mod redirect;
pub mod slug_resolver;

pub use context::{RequestContext, TRACE_HEADER};

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::HeaderName,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::AppError;
use crate::state::AppState;

/// What a stage decided for the current request.
pub enum StageOutcome {
    /// Hand the context to the next stage (or the router, after the last).
    Continue,
    /// Short-circuit with this response; later stages never run.
    Respond(Response),
}

/// One step of the request pipeline.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Stable stage name, used in logs.
    fn name(&self) -> &'static str;

    /// Processes the request context.
    ///
    /// # Errors
    ///
    /// An error terminates the chain and is rendered through
    /// [`AppError::into_response`].
    async fn run(&self, ctx: &mut RequestContext) -> Result<StageOutcome, AppError>;
}

/// An ordered chain of stages sharing one [`RequestContext`].
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// Runs the stages in order.
    ///
    /// Returns `Some(response)` when a stage short-circuited and `None` when
    /// the request should proceed to the router.
    pub async fn run(&self, ctx: &mut RequestContext) -> Option<Response> {
        for stage in &self.stages {
            tracing::trace!(stage = stage.name(), path = %ctx.raw_path, "running stage");

            match stage.run(ctx).await {
                Ok(StageOutcome::Continue) => {}
                Ok(StageOutcome::Respond(response)) => return Some(response),
                Err(e) => {
                    tracing::debug!(stage = stage.name(), "stage rejected request: {:?}", e);
                    return Some(e.into_response());
                }
            }
        }

        None
    }
}

/// Axum middleware adapter running the pipeline in front of the router.
///
/// Builds the per-request context, runs the stages, and attaches the
/// diagnostic trace header to whichever response goes out - the pipeline's
/// own or the router's.
pub async fn layer(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let mut ctx = RequestContext::from_request(&req);

    let mut response = match state.pipeline.run(&mut ctx).await {
        Some(response) => response,
        None => next.run(req).await,
    };

    if let Some(value) = ctx.trace_header() {
        response
            .headers_mut()
            .insert(HeaderName::from_static(TRACE_HEADER), value);
    }

    response
}
