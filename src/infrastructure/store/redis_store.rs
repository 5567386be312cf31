//! Redis-backed link repository.

use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, info};

use super::service::{LinkRepository, StoreError, StoreResult};
use crate::domain::entities::LinkRecord;

/// Redis KV backend for link records.
///
/// Records live under `link:<slug>` as JSON, written by external link
/// tooling. Uses `ConnectionManager` for connection reuse and automatic
/// reconnects.
pub struct RedisLinkRepository {
    client: ConnectionManager,
    key_prefix: String,
}

impl RedisLinkRepository {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the URL is invalid, the
    /// connection cannot be established, or the PING health check fails.
    pub async fn connect(redis_url: &str) -> StoreResult<Self> {
        info!("Connecting to Redis link store");

        let client = Client::open(redis_url).map_err(|e| {
            StoreError::Unavailable(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| StoreError::Unavailable(format!("Failed to connect to Redis: {}", e)))?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| StoreError::Unavailable(format!("Redis PING failed: {}", e)))?;

        info!("✓ Connected to Redis link store");

        Ok(Self {
            client: manager,
            key_prefix: "link:".to_string(),
        })
    }

    /// Constructs the full Redis key with namespace prefix.
    fn build_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl LinkRepository for RedisLinkRepository {
    async fn fetch(&self, key: &str) -> StoreResult<Option<LinkRecord>> {
        let redis_key = self.build_key(key);
        let mut conn = self.client.clone();

        let raw: Option<String> = conn
            .get(&redis_key)
            .await
            .map_err(|e| StoreError::Unavailable(format!("Redis GET failed: {}", e)))?;

        match raw {
            Some(json) => {
                debug!("Store HIT: {}", redis_key);
                let record = serde_json::from_str(&json).map_err(|source| {
                    StoreError::Malformed {
                        key: redis_key,
                        source,
                    }
                })?;
                Ok(Some(record))
            }
            None => {
                debug!("Store MISS: {}", redis_key);
                Ok(None)
            }
        }
    }

    async fn healthy(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
