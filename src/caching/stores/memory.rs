//! # In-Memory Cache Store
//!
//! Expiring key/value store on a `DashMap`. Used for `memory://` cache URLs and
//! in tests. Expired entries are dropped lazily on read, and optionally by a
//! background sweep.

use super::CacheStore;
use crate::caching::CacheResult;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::debug;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    /// `None` when the TTL is too large to represent: the entry never expires
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}

/// In-memory cache implementation
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: Arc<DashMap<String, Entry>>,
    cleanup_task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache that also sweeps expired entries every `cleanup_interval`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_cleanup(cleanup_interval: Duration) -> Self {
        let cache = Self::new();
        let entries = Arc::clone(&cache.entries);

        let handle = tokio::spawn(async move {
            let mut ticker = interval(cleanup_interval);
            loop {
                ticker.tick().await;
                let removed = Self::purge(&entries);
                if removed > 0 {
                    debug!(removed, "Cleaned up expired cache entries");
                }
            }
        });

        if let Ok(mut slot) = cache.cleanup_task.lock() {
            *slot = Some(handle);
        }
        cache
    }

    /// Remove every expired entry, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        Self::purge(&self.entries)
    }

    /// Number of stored entries, expired ones included until purged
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn purge(entries: &DashMap<String, Entry>) -> usize {
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before.saturating_sub(entries.len())
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let now = Instant::now();
        let value = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => Some(entry.value.clone()),
            Some(_) => None,
            None => return Ok(None),
        };

        if value.is_none() {
            self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now().checked_add(ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let now = Instant::now();
        Ok(self
            .entries
            .remove(key)
            .map(|(_, entry)| !entry.is_expired(now))
            .unwrap_or(false))
    }

    async fn health_check(&self) -> CacheResult<bool> {
        Ok(true)
    }

    async fn close(&self) -> CacheResult<()> {
        if let Ok(mut slot) = self.cleanup_task.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
        self.entries.clear();
        Ok(())
    }

    fn store_type(&self) -> &'static str {
        "memory"
    }
}

impl Drop for InMemoryCache {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.cleanup_task.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }
}
