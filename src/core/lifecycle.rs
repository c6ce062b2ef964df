//! # Process Lifecycle
//!
//! Bind, serve until a shutdown signal arrives, then return so the caller can
//! release whatever it acquired at startup (cache connections, etc.).

use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use crate::core::error::{GatewayError, GatewayResult};

/// Serve `app` on `addr` until SIGINT or SIGTERM, draining in-flight requests
pub async fn serve(app: Router, addr: SocketAddr, service: &str) -> GatewayResult<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| GatewayError::internal(format!("Failed to bind {} to {}: {}", service, addr, e)))?;

    info!(service, %addr, "🌐 listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| GatewayError::internal(format!("{} server error: {}", service, e)))?;

    info!(service, "🛑 server stopped");
    Ok(())
}

/// Resolves on Ctrl+C, or on SIGTERM where available
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("📡 received SIGINT, initiating graceful shutdown"),
        _ = terminate => info!("📡 received SIGTERM, initiating graceful shutdown"),
    }
}
