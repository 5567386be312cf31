//! Redirect target construction.

use url::{Url, form_urlencoded};

/// Merges an inbound query string into a destination URL.
///
/// Pairs from `query` are appended after any query the destination already
/// carries. A destination that does not parse as an absolute URL is returned
/// unchanged; the stored URL is authoritative and a redirect must still be
/// produced.
pub fn merge_query(destination: &str, query: Option<&str>) -> String {
    let Some(query) = query.filter(|q| !q.is_empty()) else {
        return destination.to_string();
    };

    let mut url = match Url::parse(destination) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("destination is not an absolute URL ({}): {}", e, destination);
            return destination.to_string();
        }
    };

    {
        let mut pairs = url.query_pairs_mut();
        pairs.extend_pairs(form_urlencoded::parse(query.as_bytes()));
    }

    url.to_string()
}
