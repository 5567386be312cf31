//! Link entity representing a stored slug-to-URL mapping.

use serde::{Deserialize, Serialize};

/// A stored link record, resolved by slug.
///
/// Deserialized from the JSON value kept in the link store. `id` is a stable
/// identifier independent of the slug and is used as the analytics join key.
/// The optional metadata fields only feed interstitial previews.
///
/// Records created by other tooling may carry extra fields; those are
/// ignored on deserialization. A record is immutable once handed to the
/// request pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub id: String,
    pub slug: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl LinkRecord {
    /// Creates a record with no preview metadata.
    pub fn new(id: impl Into<String>, slug: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            slug: slug.into(),
            url: url.into(),
            title: None,
            description: None,
            image: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_record() {
        let record: LinkRecord =
            serde_json::from_str(r#"{"id":"k7","slug":"promo","url":"https://example.com"}"#)
                .unwrap();

        assert_eq!(record.id, "k7");
        assert_eq!(record.slug, "promo");
        assert_eq!(record.url, "https://example.com");
        assert!(record.title.is_none());
    }

    #[test]
    fn test_deserialize_ignores_unknown_fields() {
        let record: LinkRecord = serde_json::from_str(
            r#"{"id":"k7","slug":"promo","url":"https://example.com","createdAt":1718000000,"comment":"legacy"}"#,
        )
        .unwrap();

        assert_eq!(record.slug, "promo");
    }

    #[test]
    fn test_deserialize_rejects_missing_url() {
        let result = serde_json::from_str::<LinkRecord>(r#"{"id":"k7","slug":"promo"}"#);
        assert!(result.is_err());
    }
}
