//! Read-through TTL cache in front of the backing link repository.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use super::service::{LinkRepository, StoreResult};
use crate::domain::entities::LinkRecord;

struct CacheEntry {
    record: LinkRecord,
    expires_at: Instant,
}

/// Caching facade over a [`LinkRepository`].
///
/// `get` serves from the in-process cache when a live entry exists and falls
/// through to the backing store otherwise, populating the cache with the
/// supplied TTL on success. Expired entries are never returned. Only hits
/// are cached; misses always reach the backend so newly created links become
/// visible immediately.
///
/// Concurrent fills of the same key are tolerated (last write wins) since
/// entries for a given key are identical within a TTL window.
pub struct CachedLinkStore {
    backing: Arc<dyn LinkRepository>,
    entries: DashMap<String, CacheEntry>,
}

impl CachedLinkStore {
    pub fn new(backing: Arc<dyn LinkRepository>) -> Self {
        Self {
            backing,
            entries: DashMap::new(),
        }
    }

    /// Looks up `key`, reading through the cache with the given TTL.
    ///
    /// # Errors
    ///
    /// Propagates backing-store errors untouched; a store failure is never
    /// reported as a miss.
    pub async fn get(&self, key: &str, ttl: Duration) -> StoreResult<Option<LinkRecord>> {
        let live = self.entries.get(key).and_then(|entry| {
            (entry.expires_at > Instant::now()).then(|| entry.record.clone())
        });

        if let Some(record) = live {
            debug!("Cache HIT: {}", key);
            metrics::counter!("link_cache_hits_total").increment(1);
            return Ok(Some(record));
        }

        self.entries
            .remove_if(key, |_, entry| entry.expires_at <= Instant::now());

        debug!("Cache MISS: {}", key);
        metrics::counter!("link_cache_misses_total").increment(1);

        let fetched = self.backing.fetch(key).await?;

        if let Some(ref record) = fetched {
            self.entries.insert(
                key.to_string(),
                CacheEntry {
                    record: record.clone(),
                    expires_at: Instant::now() + ttl,
                },
            );
        }

        Ok(fetched)
    }

    /// Reports backend health for the health endpoint.
    pub async fn healthy(&self) -> bool {
        self.backing.healthy().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::store::{MockLinkRepository, StoreError};

    fn record() -> LinkRecord {
        LinkRecord::new("id-1", "promo", "https://example.com/x")
    }

    #[tokio::test]
    async fn test_repeated_get_within_ttl_hits_backend_once() {
        let mut mock = MockLinkRepository::new();
        mock.expect_fetch()
            .times(1)
            .returning(|_| Ok(Some(record())));

        let store = CachedLinkStore::new(Arc::new(mock));
        let ttl = Duration::from_secs(60);

        let first = store.get("promo", ttl).await.unwrap().unwrap();
        let second = store.get("promo", ttl).await.unwrap().unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_expired_entry_falls_through() {
        let mut mock = MockLinkRepository::new();
        mock.expect_fetch()
            .times(2)
            .returning(|_| Ok(Some(record())));

        let store = CachedLinkStore::new(Arc::new(mock));
        let ttl = Duration::from_millis(20);

        assert!(store.get("promo", ttl).await.unwrap().is_some());
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(store.get("promo", ttl).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_miss_is_not_cached() {
        let mut mock = MockLinkRepository::new();
        mock.expect_fetch().times(2).returning(|_| Ok(None));

        let store = CachedLinkStore::new(Arc::new(mock));
        let ttl = Duration::from_secs(60);

        assert!(store.get("ghost", ttl).await.unwrap().is_none());
        assert!(store.get("ghost", ttl).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_backend_error_propagates() {
        let mut mock = MockLinkRepository::new();
        mock.expect_fetch()
            .times(1)
            .returning(|_| Err(StoreError::Unavailable("connection refused".into())));

        let store = CachedLinkStore::new(Arc::new(mock));

        let result = store.get("promo", Duration::from_secs(60)).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }
}
