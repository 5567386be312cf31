//! In-memory link repository for tests and degraded startup.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::service::{LinkRepository, StoreResult};
use crate::domain::entities::LinkRecord;

/// A link repository held entirely in process memory.
///
/// Used when `REDIS_URL` is not configured (the service starts, but nothing
/// resolves until records are inserted) and as the backing store in tests,
/// where the lookup counter lets tests assert that reserved slugs and cache
/// hits never reach the backend.
#[derive(Default)]
pub struct MemoryLinkRepository {
    records: RwLock<HashMap<String, LinkRecord>>,
    lookups: AtomicUsize,
}

impl MemoryLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a record under the given lookup key.
    pub fn insert(&self, key: impl Into<String>, record: LinkRecord) {
        self.records
            .write()
            .expect("link map poisoned")
            .insert(key.into(), record);
    }

    /// Number of `fetch` calls that reached this backend.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LinkRepository for MemoryLinkRepository {
    async fn fetch(&self, key: &str) -> StoreResult<Option<LinkRecord>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .records
            .read()
            .expect("link map poisoned")
            .get(key)
            .cloned())
    }

    async fn healthy(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_counts_lookups() {
        let repo = MemoryLinkRepository::new();
        repo.insert("promo", LinkRecord::new("1", "promo", "https://example.com"));

        assert!(repo.fetch("promo").await.unwrap().is_some());
        assert!(repo.fetch("missing").await.unwrap().is_none());
        assert_eq!(repo.lookups(), 2);
    }
}
