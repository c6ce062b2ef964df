//! # Caching System Module
//!
//! Cache-aside support for the HarborX backend services.
//!
//! ## Architecture
//! 1. **Cache Stores**: Redis and in-memory implementations of [`CacheStore`]
//! 2. **Cache Client**: a process-wide handle that is either connected to a store
//!    or disconnected, and that turns every store failure into a miss
//! 3. **Resolver**: the check/compute/store state machine used by handlers
//!
//! ## Usage Example
//! ```rust,ignore
//! use std::sync::Arc;
//! use harborx::caching::{CacheAsideResolver, CacheClient};
//!
//! let client = Arc::new(CacheClient::connect("redis://localhost:6379").await);
//! let resolver = CacheAsideResolver::new(client);
//!
//! let shipments: Vec<Shipment> = resolver
//!     .resolve("shipments:list", 30, || async { repository.list().await })
//!     .await?;
//! ```

pub mod client;
pub mod resolver;
pub mod stores;

pub use client::CacheClient;
pub use resolver::CacheAsideResolver;
pub use stores::{CacheStore, InMemoryCache, RedisCache};

use crate::core::error::GatewayError;

/// Cache operation result
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache-specific error types
///
/// Only [`CacheError::Corrupt`] normally reaches a caller; the resolver treats
/// the others as a miss.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache not available")]
    Unavailable,

    #[error("Cache store error: {message}")]
    Store { message: String },

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Cached value for '{key}' has an unexpected shape: {message}")]
    Corrupt { key: String, message: String },
}

impl CacheError {
    pub fn store<S: Into<String>>(message: S) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// True for failures that mean "the cache could not answer"
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable | Self::Store { .. } | Self::Redis(_))
    }
}

impl From<CacheError> for GatewayError {
    fn from(err: CacheError) -> Self {
        GatewayError::internal(format!("Cache error: {}", err))
    }
}
