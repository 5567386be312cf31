//! Redirect event model for asynchronous analytics dispatch.

use chrono::{DateTime, Utc};

/// An in-memory description of one served redirect, for async delivery.
///
/// Built in the analytics stage from the request context and handed to the
/// delivery worker via a channel, so the HTTP response never waits on the
/// collector. All fields are denormalized strings; missing request headers
/// become empty strings rather than failing the event.
#[derive(Debug, Clone)]
pub struct RedirectEvent {
    /// Client identifier: forwarded IP header, peer address, or a sentinel.
    pub client_id: String,
    pub user_agent: String,
    /// The slug as requested, separators stripped, casing preserved.
    pub slug: String,
    /// The resolved destination URL, without query forwarding applied.
    pub destination: String,
    pub referrer: String,
    /// Serving host from the request, may be empty.
    pub host: String,
    pub timestamp: DateTime<Utc>,
}
