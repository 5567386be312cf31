//! Client identifier resolution from request headers.

use std::net::SocketAddr;

use axum::http::HeaderMap;

/// Fallback identifier when neither a forwarded header nor a peer address is
/// available (e.g. behind a buffering proxy that strips both).
pub const ANONYMOUS_CLIENT_ID: &str = "555";

/// Resolves the client identifier used for analytics.
///
/// Precedence: `CF-Connecting-IP`, then the first entry of
/// `X-Forwarded-For`, then `X-Real-IP`, then the transport peer address,
/// then [`ANONYMOUS_CLIENT_ID`].
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = header_str(headers, "cf-connecting-ip")
        .or_else(|| {
            header_str(headers, "x-forwarded-for")
                .and_then(|v| v.split(',').next().map(str::trim).filter(|s| !s.is_empty()))
        })
        .or_else(|| header_str(headers, "x-real-ip"));

    match forwarded {
        Some(ip) => ip.to_string(),
        None => peer
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| ANONYMOUS_CLIENT_ID.to_string()),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
