//! Per-request state threaded through the pipeline stages.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request};
use axum::http::{HeaderMap, HeaderValue, header};

use crate::domain::entities::LinkRecord;
use crate::utils::client_ip::client_ip;

/// Response header carrying the pipeline's diagnostic flags.
pub const TRACE_HEADER: &str = "x-redirect-trace";

/// Mutable per-request state owned by the pipeline.
///
/// Created once at request entry and dropped when the response completes;
/// never shared across requests. Stages communicate exclusively through this
/// struct: the resolver writes the slug and link, the analytics stage reads
/// them, and every stage may append diagnostic flags.
#[derive(Debug)]
pub struct RequestContext {
    /// Request path as received (after path normalization).
    pub raw_path: String,
    /// Raw query string, without the leading `?`.
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub host: Option<String>,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    /// Analytics client identifier, resolved once at entry.
    pub client_id: String,
    /// Candidate slug with separators stripped, casing preserved.
    pub slug: Option<String>,
    link: Option<LinkRecord>,
    flags: Vec<&'static str>,
}

impl RequestContext {
    /// Captures the request data the stages need.
    ///
    /// The peer address is read from the [`ConnectInfo`] extension when the
    /// server was started with connect info; tests without it simply fall
    /// back through the client-id chain.
    pub fn from_request(req: &Request) -> Self {
        let headers = req.headers();
        let peer = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Self {
            raw_path: req.uri().path().to_string(),
            query: req.uri().query().map(str::to_string),
            authorization: header_string(headers, header::AUTHORIZATION.as_str()),
            host: header_string(headers, header::HOST.as_str()),
            referer: header_string(headers, header::REFERER.as_str()),
            user_agent: header_string(headers, header::USER_AGENT.as_str()),
            client_id: client_ip(headers, peer),
            slug: None,
            link: None,
            flags: Vec::new(),
        }
    }

    pub fn link(&self) -> Option<&LinkRecord> {
        self.link.as_ref()
    }

    /// Records the resolved link. The first write wins; a second write is a
    /// stage-ordering bug and is logged and ignored.
    pub fn set_link(&mut self, link: LinkRecord) {
        if self.link.is_some() {
            tracing::warn!(slug = ?self.slug, "resolved link already set, ignoring overwrite");
            return;
        }
        self.link = Some(link);
    }

    /// Appends a diagnostic flag. Flags are append-only and surface on the
    /// response in the [`TRACE_HEADER`] header.
    pub fn flag(&mut self, tag: &'static str) {
        self.flags.push(tag);
    }

    pub fn flags(&self) -> &[&'static str] {
        &self.flags
    }

    /// Renders the diagnostic flags as a header value, if any were set.
    pub fn trace_header(&self) -> Option<HeaderValue> {
        if self.flags.is_empty() {
            return None;
        }
        HeaderValue::from_str(&self.flags.join(",")).ok()
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn context_for(uri: &str) -> RequestContext {
        let req = axum::http::Request::builder()
            .uri(uri)
            .header("user-agent", "TestBot/1.0")
            .body(Body::empty())
            .unwrap();
        RequestContext::from_request(&req)
    }

    #[test]
    fn test_captures_path_and_query() {
        let ctx = context_for("/PROMO?ref=email");

        assert_eq!(ctx.raw_path, "/PROMO");
        assert_eq!(ctx.query.as_deref(), Some("ref=email"));
        assert_eq!(ctx.user_agent.as_deref(), Some("TestBot/1.0"));
    }

    #[test]
    fn test_link_is_set_once() {
        let mut ctx = context_for("/promo");

        ctx.set_link(LinkRecord::new("1", "promo", "https://first.example"));
        ctx.set_link(LinkRecord::new("2", "promo", "https://second.example"));

        assert_eq!(ctx.link().unwrap().url, "https://first.example");
    }

    #[test]
    fn test_flags_append_and_render() {
        let mut ctx = context_for("/promo");
        assert!(ctx.trace_header().is_none());

        ctx.flag("link-not-found");
        ctx.flag("store-unavailable");

        assert_eq!(ctx.flags(), &["link-not-found", "store-unavailable"]);
        assert_eq!(
            ctx.trace_header().unwrap().to_str().unwrap(),
            "link-not-found,store-unavailable"
        );
    }
}
