//! Bearer-token gate for the protected API routes.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::{RequestContext, Stage, StageOutcome};
use crate::config::Config;
use crate::error::AppError;

/// Path prefix requiring a bearer credential.
const PROTECTED_PREFIX: &str = "/api/";

/// Introspection sub-prefix exempt from authentication.
const INTERNAL_PREFIX: &str = "/api/_";

/// Minimum credential length accepted before comparing against the secret.
const MIN_TOKEN_LENGTH: usize = 8;

/// First pipeline stage: rejects unauthenticated API requests.
///
/// Applies to paths under `/api/`, excluding `/api/_` (the service's own
/// introspection endpoints). Rejections terminate the pipeline - the
/// resolver and dispatcher never see the request. Rejection reasons, in
/// priority order: missing credential, credential too short, credential
/// mismatch. Each yields 401 with its own reason so callers can tell a
/// misconfigured client from a bad secret.
pub struct AuthGate {
    config: Arc<Config>,
}

impl AuthGate {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    fn applies_to(path: &str) -> bool {
        path.starts_with(PROTECTED_PREFIX) && !path.starts_with(INTERNAL_PREFIX)
    }
}

#[async_trait]
impl Stage for AuthGate {
    fn name(&self) -> &'static str {
        "auth-gate"
    }

    async fn run(&self, ctx: &mut RequestContext) -> Result<StageOutcome, AppError> {
        if !Self::applies_to(&ctx.raw_path) {
            return Ok(StageOutcome::Continue);
        }

        let token = ctx
            .authorization
            .as_deref()
            .map(|header| header.strip_prefix("Bearer ").unwrap_or(header).trim())
            .filter(|token| !token.is_empty());

        let Some(token) = token else {
            return Err(AppError::unauthorized(
                "Authentication token is required",
                json!({ "reason": "missing-token" }),
            ));
        };

        if token.len() < MIN_TOKEN_LENGTH {
            return Err(AppError::unauthorized(
                format!(
                    "Token is too short, must be at least {} characters",
                    MIN_TOKEN_LENGTH
                ),
                json!({ "reason": "token-too-short" }),
            ));
        }

        if token != self.config.site_token {
            return Err(AppError::unauthorized(
                "Invalid authentication token",
                json!({ "reason": "token-mismatch" }),
            ));
        }

        Ok(StageOutcome::Continue)
    }
}
