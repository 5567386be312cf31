//! Link store: backing repositories plus a read-through TTL cache.
//!
//! Provides a [`LinkRepository`] trait with two implementations:
//! - [`RedisLinkRepository`] - production Redis-backed KV store
//! - [`MemoryLinkRepository`] - in-memory store for tests and degraded startup
//!
//! [`CachedLinkStore`] wraps a repository with the in-process cache the
//! resolver reads through.

mod cached;
mod memory_store;
mod redis_store;
mod service;

pub use cached::CachedLinkStore;
pub use memory_store::MemoryLinkRepository;
pub use redis_store::RedisLinkRepository;
pub use service::{LinkRepository, StoreError, StoreResult};

#[cfg(test)]
pub use service::MockLinkRepository;
