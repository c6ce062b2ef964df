//! # Cache Client
//!
//! Process-wide cache handle shared by request handlers through `Arc`.
//!
//! The client is either connected to a [`CacheStore`] or disconnected. A failed
//! connection at startup is logged and leaves the client disconnected; the
//! service keeps running and every lookup simply misses. Store errors during
//! operation are likewise logged and reported as absent/`false`.

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use super::stores::{CacheStore, InMemoryCache, RedisCache, RedisCacheConfig};

/// URL scheme selecting the in-process store
pub const MEMORY_SCHEME: &str = "memory://";

/// Sweep interval for the in-process store
const MEMORY_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

pub struct CacheClient {
    store: Option<Arc<dyn CacheStore>>,
}

impl CacheClient {
    /// A client with no store; every read misses and every write is dropped
    pub fn disconnected() -> Self {
        Self { store: None }
    }

    pub fn with_store(store: Arc<dyn CacheStore>) -> Self {
        Self { store: Some(store) }
    }

    /// Connect to the store named by `url`.
    ///
    /// `memory://` selects the in-process store, anything else is handed to
    /// Redis. Never fails: on error the client comes back disconnected.
    pub async fn connect(url: &str) -> Self {
        if url.starts_with(MEMORY_SCHEME) {
            info!("✅ Using in-memory cache store");
            return Self::with_store(Arc::new(InMemoryCache::with_cleanup(MEMORY_CLEANUP_INTERVAL)));
        }

        match RedisCache::new(RedisCacheConfig::with_url(url)).await {
            Ok(store) => {
                info!("✅ Connected to Redis");
                Self::with_store(Arc::new(store))
            }
            Err(e) => {
                error!(error = %e, "❌ Failed to connect to Redis, continuing without cache");
                Self::disconnected()
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.store.is_some()
    }

    /// Cached value for `key`, or `None` on miss, expiry or any failure
    pub async fn get(&self, key: &str) -> Option<String> {
        let store = self.store.as_ref()?;
        match store.get(key).await {
            Ok(value) => value,
            Err(e) => {
                error!(key, store = store.store_type(), error = %e, "Cache get error");
                None
            }
        }
    }

    /// Store `value` under `key` for `ttl_secs` seconds; `false` if not stored
    pub async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> bool {
        let Some(store) = self.store.as_ref() else {
            return false;
        };
        match store.set(key, value, Duration::from_secs(ttl_secs)).await {
            Ok(()) => true,
            Err(e) => {
                error!(key, store = store.store_type(), error = %e, "Cache set error");
                false
            }
        }
    }

    /// Remove `key`; `false` if it was absent or the store failed
    pub async fn delete(&self, key: &str) -> bool {
        let Some(store) = self.store.as_ref() else {
            return false;
        };
        match store.delete(key).await {
            Ok(removed) => removed,
            Err(e) => {
                error!(key, store = store.store_type(), error = %e, "Cache delete error");
                false
            }
        }
    }

    /// Whether the store answers a health check right now
    pub async fn ping(&self) -> bool {
        match self.store.as_ref() {
            Some(store) => store.health_check().await.unwrap_or(false),
            None => false,
        }
    }

    /// Release the store during shutdown
    pub async fn disconnect(self) {
        if let Some(store) = self.store {
            if let Err(e) = store.close().await {
                warn!(error = %e, "Error while closing cache store");
            }
            info!("🔌 Disconnected from cache");
        }
    }
}

impl Default for CacheClient {
    fn default() -> Self {
        Self::disconnected()
    }
}

impl std::fmt::Debug for CacheClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheClient")
            .field("store", &self.store.as_ref().map(|store| store.store_type()))
            .finish()
    }
}
