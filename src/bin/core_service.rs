//! HarborX core service: shipment operations behind the gateway.
//!
//! Connects the cache at startup (a failed connection is logged and the
//! service runs uncached) and disconnects it after the server has drained.

use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};

use harborx::caching::{CacheAsideResolver, CacheClient};
use harborx::core::config::{self, CoreServiceConfig};
use harborx::core::lifecycle::serve;
use harborx::observability::init_logging;
use harborx::protocols::cors_layer;
use harborx::services::core::{self as core_service, CoreState, InMemoryShipmentRepository};
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config: CoreServiceConfig = config::load()
        .await
        .context("failed to load core service configuration")?;

    init_logging(&config.logging, core_service::SERVICE_NAME)?;
    info!("🚀 Starting HarborX core service");

    let cache = Arc::new(CacheClient::connect(&config.cache.url).await);
    let resolver = CacheAsideResolver::new(Arc::clone(&cache));
    let state = CoreState::new(resolver, Arc::new(InMemoryShipmentRepository::new()))
        .with_list_ttl(config.cache.shipments_ttl.as_secs());

    let app = core_service::router(state, config.environment.clone())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors()));
    let addr = config.server.socket_addr()?;

    serve(app, addr, core_service::SERVICE_NAME).await?;

    match Arc::try_unwrap(cache) {
        Ok(cache) => cache.disconnect().await,
        Err(_) => warn!("Cache client still referenced at shutdown, dropping without disconnect"),
    }

    info!("✅ HarborX core service shutdown complete");
    Ok(())
}
