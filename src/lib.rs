//! # HarborX Platform Library
//!
//! Shared building blocks for the three HarborX services:
//!
//! - the **gateway** (`harborx-gateway`), which reverse-proxies client requests to the
//!   backend services, aggregates their health, and translates backend and network
//!   failures into one JSON error contract;
//! - the **core service** (`harborx-core`), whose shipment read path uses a
//!   cache-aside resolver in front of the persistence layer;
//! - the **auth service** (`harborx-auth`), currently a stub surface.
//!
//! Every long-lived collaborator (HTTP client, cache client, backend list) is built
//! once at startup and injected into the axum router state. Nothing is stored in
//! module-level globals.

/// Error types, configuration, domain types and process lifecycle helpers
pub mod core;

/// Request forwarding, error translation and the gateway HTTP surface
pub mod gateway;

/// HTTP protocol concerns shared by every service (CORS)
pub mod protocols;

/// Structured logging and backend health probing
pub mod observability;

/// Cache client, cache stores and the cache-aside resolver
pub mod caching;

/// Core (shipments) and auth service surfaces
pub mod services;

pub use crate::core::error::{GatewayError, GatewayResult, ProxyError};
pub use crate::core::config::{AuthServiceConfig, CoreServiceConfig, GatewayConfig};
pub use crate::core::types::{BackendTarget, InboundRequest, ProxyMethod, ProxyRequest, ProxySuccess};
pub use caching::{CacheAsideResolver, CacheClient, CacheError, CacheResult};
pub use gateway::forwarder::RequestForwarder;
pub use observability::health::{BackendHealthProber, HealthStatus};
