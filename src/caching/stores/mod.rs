//! # Cache Stores Module
//!
//! Redis and in-memory implementations of the string key/value store the
//! cache client talks to. Values are serialized JSON text.

pub mod memory;
pub mod redis_store;

pub use memory::InMemoryCache;
pub use redis_store::{RedisCache, RedisCacheConfig};

use super::CacheResult;
use async_trait::async_trait;
use std::time::Duration;

/// Trait for cache store implementations
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a value from the cache; expired entries read as absent
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Set a value in the cache with TTL, replacing any previous value
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    /// Delete a value from the cache, returning whether it existed
    async fn delete(&self, key: &str) -> CacheResult<bool>;

    /// Perform health check
    async fn health_check(&self) -> CacheResult<bool>;

    /// Release connections and background tasks
    async fn close(&self) -> CacheResult<()>;

    /// Store name used in logs
    fn store_type(&self) -> &'static str;
}
