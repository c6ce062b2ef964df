//! HarborX auth service.

use anyhow::Context;
use tower_http::trace::TraceLayer;
use tracing::info;

use harborx::core::config::{self, AuthServiceConfig};
use harborx::core::lifecycle::serve;
use harborx::observability::init_logging;
use harborx::protocols::cors_layer;
use harborx::services::auth;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config: AuthServiceConfig = config::load()
        .await
        .context("failed to load auth service configuration")?;

    init_logging(&config.logging, auth::SERVICE_NAME)?;
    info!("🚀 Starting HarborX auth service");

    let app = auth::router(config.environment.clone())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors()));
    let addr = config.server.socket_addr()?;

    serve(app, addr, auth::SERVICE_NAME).await?;

    info!("✅ HarborX auth service shutdown complete");
    Ok(())
}
