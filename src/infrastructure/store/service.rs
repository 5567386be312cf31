//! Link repository trait and error types.

use async_trait::async_trait;

use crate::domain::entities::LinkRecord;

/// Errors from the backing link store.
///
/// `Unavailable` and `Malformed` stay distinct from an `Ok(None)` miss: a
/// transient store failure must never be reported as a slug that does not
/// exist.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("link store unavailable: {0}")]
    Unavailable(String),

    #[error("malformed link record for key '{key}': {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Repository interface for resolving link records by key.
///
/// Implementations must be thread-safe. Keys arrive already case-folded (or
/// not) by the resolver; the repository is a dumb KV lookup.
///
/// # Implementations
///
/// - [`crate::infrastructure::store::RedisLinkRepository`] - Redis KV backend
/// - [`crate::infrastructure::store::MemoryLinkRepository`] - in-memory backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Fetches the record stored under `key`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(record))` when the key exists
    /// - `Ok(None)` when it does not
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when the backend cannot be
    /// reached and [`StoreError::Malformed`] when the stored value does not
    /// decode as a link record.
    async fn fetch(&self, key: &str) -> StoreResult<Option<LinkRecord>>;

    /// Checks whether the backend is reachable.
    ///
    /// Used by the health endpoint.
    async fn healthy(&self) -> bool;
}
