//! Slug resolution against the link store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::response::{IntoResponse, Redirect};
use tracing::{debug, error};

use super::{RequestContext, Stage, StageOutcome};
use crate::config::Config;
use crate::error::AppError;
use crate::infrastructure::store::{CachedLinkStore, StoreError};

/// Second pipeline stage: turns the request path into a resolved link.
///
/// The candidate slug is the path with exactly one leading and one trailing
/// separator stripped. Candidates that are empty, reserved, or fail the slug
/// pattern are never looked up - internal and asset routes must not pollute
/// the cache or cost a store round trip.
///
/// Lookup keys follow the store's case policy: verbatim when case-sensitive,
/// lower-cased otherwise. In case-insensitive mode a miss on a mixed-case
/// candidate is retried with the original casing, so links created under the
/// old case-sensitive policy keep resolving.
///
/// A store failure is logged and flagged but never fails the request; the
/// response falls through to the router's 404 exactly like a genuine miss.
pub struct SlugResolver {
    config: Arc<Config>,
    store: Arc<CachedLinkStore>,
}

impl SlugResolver {
    pub fn new(config: Arc<Config>, store: Arc<CachedLinkStore>) -> Self {
        Self { config, store }
    }

    /// Strips exactly one leading and one trailing path separator.
    fn candidate(path: &str) -> &str {
        let path = path.strip_prefix('/').unwrap_or(path);
        path.strip_suffix('/').unwrap_or(path)
    }

    fn is_resolvable(&self, candidate: &str) -> bool {
        !candidate.is_empty()
            && !self.config.reserved_slugs.iter().any(|s| s == candidate)
            && self.config.slug_pattern.is_match(candidate)
    }
}

#[async_trait]
impl Stage for SlugResolver {
    fn name(&self) -> &'static str {
        "slug-resolver"
    }

    async fn run(&self, ctx: &mut RequestContext) -> Result<StageOutcome, AppError> {
        if ctx.raw_path == "/"
            && let Some(home) = &self.config.home_url
        {
            ctx.flag("home-redirect");
            return Ok(StageOutcome::Respond(
                Redirect::temporary(home).into_response(),
            ));
        }

        let candidate = Self::candidate(&ctx.raw_path);
        if !self.is_resolvable(candidate) {
            return Ok(StageOutcome::Continue);
        }

        let candidate = candidate.to_string();
        ctx.slug = Some(candidate.clone());

        let ttl = Duration::from_secs(self.config.link_cache_ttl);

        let lookup_key = if self.config.case_sensitive {
            candidate.clone()
        } else {
            candidate.to_lowercase()
        };

        let mut lookup = self.store.get(&lookup_key, ttl).await;

        // Mixed-case slugs created under the old case-sensitive policy are
        // stored under their original casing.
        if !self.config.case_sensitive
            && matches!(lookup, Ok(None))
            && lookup_key != candidate
        {
            debug!(slug = %candidate, "lower-case lookup missed, retrying original casing");
            ctx.flag("case-fallback");
            lookup = self.store.get(&candidate, ttl).await;
        }

        match lookup {
            Ok(Some(link)) => {
                debug!(slug = %candidate, url = %link.url, "slug resolved");
                ctx.set_link(link);
            }
            Ok(None) => {
                ctx.flag("link-not-found");
            }
            Err(StoreError::Unavailable(reason)) => {
                error!(slug = %candidate, "link store unavailable: {}", reason);
                metrics::counter!("store_errors_total").increment(1);
                ctx.flag("store-unavailable");
            }
            Err(StoreError::Malformed { key, source }) => {
                error!(key = %key, "malformed link record: {}", source);
                metrics::counter!("store_errors_total").increment(1);
                ctx.flag("malformed-record");
            }
        }

        Ok(StageOutcome::Continue)
    }
}
