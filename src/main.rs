//! # HarborX Gateway - Main Entry Point
//!
//! Single public entry point of the HarborX platform. Client requests under
//! `/api/v1/auth/` and `/api/v1/shipments` are forwarded to the auth and core
//! services; `/health` reports the state of both.
//!
//! Startup: load configuration, initialize logging, build the HTTP client and
//! router, then serve until SIGINT/SIGTERM.

use anyhow::Context;
use tracing::info;

use harborx::core::config::{self, GatewayConfig};
use harborx::core::lifecycle::serve;
use harborx::gateway::{build_router, GatewayState};
use harborx::observability::init_logging;

const SERVICE_NAME: &str = "harborx-gateway";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config: GatewayConfig = config::load()
        .await
        .context("failed to load gateway configuration")?;

    init_logging(&config.logging, SERVICE_NAME)?;

    info!("🚀 Starting HarborX gateway");
    info!(
        auth = %config.backends.auth_service_url,
        core = %config.backends.core_service_url,
        environment = %config.environment,
        "🔗 Backend services configured"
    );

    let state = GatewayState::from_config(&config).context("failed to initialize gateway")?;
    let app = build_router(state, &config.cors());
    let addr = config.server.socket_addr()?;

    serve(app, addr, SERVICE_NAME).await?;

    info!("✅ HarborX gateway shutdown complete");
    Ok(())
}
