//! # Cache-Aside Resolver
//!
//! `CHECK_CACHE → hit: RETURN_CACHED | miss: COMPUTE → STORE → RETURN_COMPUTED`
//!
//! A hit is deserialized and returned without running `compute`. A miss, an
//! unavailable cache or a store error all fall through to `compute`; its result
//! is written back with the requested TTL and returned whether or not the write
//! succeeded. A cached value that no longer matches the requested type is
//! reported as [`CacheError::Corrupt`] instead of being silently recomputed.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{CacheClient, CacheError, CacheResult};

#[derive(Debug, Clone)]
pub struct CacheAsideResolver {
    client: Arc<CacheClient>,
}

impl CacheAsideResolver {
    pub fn new(client: Arc<CacheClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<CacheClient> {
        &self.client
    }

    /// Resolve `key` through the cache with an infallible `compute`
    pub async fn resolve<T, F, Fut>(&self, key: &str, ttl_secs: u64, compute: F) -> CacheResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.try_resolve(key, ttl_secs, move || async move { Ok::<T, CacheError>(compute().await) })
            .await
    }

    /// Resolve `key` through the cache with a fallible `compute`.
    ///
    /// A `compute` error is returned unchanged and nothing is stored.
    pub async fn try_resolve<T, E, F, Fut>(&self, key: &str, ttl_secs: u64, compute: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self.client.get(key).await {
            debug!(key, "Cache hit");
            return serde_json::from_str(&cached).map_err(|e| {
                CacheError::Corrupt {
                    key: key.to_string(),
                    message: e.to_string(),
                }
                .into()
            });
        }

        debug!(key, "Cache miss, computing");
        let value = compute().await?;

        match serde_json::to_string(&value) {
            Ok(serialized) => {
                if !self.client.set(key, &serialized, ttl_secs).await {
                    debug!(key, "Computed value was not cached");
                }
            }
            Err(e) => warn!(key, error = %e, "Failed to serialize computed value for cache"),
        }

        Ok(value)
    }
}
