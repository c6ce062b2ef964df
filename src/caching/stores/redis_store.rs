//! # Redis Cache Store
//!
//! Redis-backed store using a multiplexed `ConnectionManager`, which reconnects
//! on its own after a dropped connection. Every key is namespaced with a
//! configurable prefix.

use super::CacheStore;
use crate::caching::{CacheError, CacheResult};
use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info};

/// Redis cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisCacheConfig {
    /// Redis connection URL
    pub url: String,

    /// Connection timeout
    #[serde(with = "humantime_serde")]
    pub connection_timeout: Duration,

    /// Key prefix for all cache entries
    pub key_prefix: String,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connection_timeout: Duration::from_secs(5),
            key_prefix: String::new(),
        }
    }
}

impl RedisCacheConfig {
    pub fn with_url<S: Into<String>>(url: S) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

/// Redis cache implementation
pub struct RedisCache {
    config: RedisCacheConfig,
    connection_manager: ConnectionManager,
}

impl RedisCache {
    /// Open the connection, failing if the server cannot be reached within
    /// the configured timeout
    pub async fn new(config: RedisCacheConfig) -> CacheResult<Self> {
        let client = Client::open(config.url.as_str())?;

        let connection_manager = timeout(config.connection_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| {
                CacheError::store(format!(
                    "Timed out connecting to Redis after {:?}",
                    config.connection_timeout
                ))
            })??;

        info!(url = %config.url, "Redis cache connected");

        Ok(Self {
            config,
            connection_manager,
        })
    }

    /// Get the full cache key with prefix
    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.config.key_prefix, key)
    }

    fn connection(&self) -> ConnectionManager {
        self.connection_manager.clone()
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let full_key = self.full_key(key);
        let mut conn = self.connection();
        let value: Option<String> = conn.get(&full_key).await?;
        debug!(key = %full_key, hit = value.is_some(), "Redis GET");
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let full_key = self.full_key(key);
        // Redis rejects SETEX with a zero expiry
        let ttl_seconds = ttl.as_secs().max(1);
        let mut conn = self.connection();
        conn.set_ex::<_, _, ()>(&full_key, value, ttl_seconds).await?;
        debug!(key = %full_key, ttl_seconds, "Redis SETEX");
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let full_key = self.full_key(key);
        let mut conn = self.connection();
        let removed: i64 = conn.del(&full_key).await?;
        Ok(removed > 0)
    }

    async fn health_check(&self) -> CacheResult<bool> {
        let mut conn = self.connection();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }

    async fn close(&self) -> CacheResult<()> {
        // The manager closes its socket when the last clone is dropped.
        info!(url = %self.config.url, "Redis cache connection released");
        Ok(())
    }

    fn store_type(&self) -> &'static str {
        "redis"
    }
}
