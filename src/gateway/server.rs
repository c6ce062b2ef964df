//! # Gateway HTTP Server
//!
//! Builds the gateway's axum router: `GET /health` reports backend health, and
//! every other path falls through to the proxy handler, which looks up the
//! owning backend in the [`RouteTable`] and forwards the request.
//!
//! ## Rust Concepts Used
//!
//! - `Arc<T>` for sharing server state across request tasks
//! - Axum's `State` extractor for dependency injection
//! - Tower layers for tracing and CORS

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::core::config::GatewayConfig;
use crate::core::error::GatewayResult;
use crate::core::types::{InboundRequest, ProxyMethod};
use crate::gateway::forwarder::RequestForwarder;
use crate::gateway::routing::RouteTable;
use crate::observability::health::BackendHealthProber;
use crate::protocols::http::{cors_layer, CorsConfig};

/// Name reported by the gateway's health endpoint
pub const SERVICE_NAME: &str = "gateway";

/// Shared state injected into every handler
#[derive(Debug, Clone)]
pub struct GatewayState {
    pub forwarder: Arc<RequestForwarder>,
    pub prober: BackendHealthProber,
    pub routes: Arc<RouteTable>,
    pub max_body_size: usize,
}

impl GatewayState {
    pub fn new(
        forwarder: RequestForwarder,
        prober: BackendHealthProber,
        routes: RouteTable,
        max_body_size: usize,
    ) -> Self {
        Self {
            forwarder: Arc::new(forwarder),
            prober,
            routes: Arc::new(routes),
            max_body_size,
        }
    }

    /// Wire up clients and routes from configuration
    pub fn from_config(config: &GatewayConfig) -> GatewayResult<Self> {
        Ok(Self::new(
            RequestForwarder::new(config.timeouts.forward_timeout)?,
            BackendHealthProber::http(config.timeouts.health_check_timeout)?,
            RouteTable::harborx(config.auth_target(), config.core_target()),
            config.server.max_request_size,
        ))
    }
}

/// Build the gateway router
pub fn build_router(state: GatewayState, cors: &CorsConfig) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_body_size);

    Router::new()
        .route("/health", get(health_handler))
        .fallback(proxy_handler)
        .with_state(state)
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors))
}

/// Gateway health: always 200, status carried in the body
async fn health_handler(State(state): State<GatewayState>) -> impl IntoResponse {
    let health = state.prober.probe(&state.routes.targets()).await;

    Json(json!({
        "status": health.status,
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "backend_services": health.backend_services,
    }))
}

async fn proxy_handler(State(state): State<GatewayState>, request: Request) -> Response {
    let path = request.uri().path().to_string();

    let Some(target) = state.routes.resolve(&path) else {
        debug!(path = %path, "No route for path");
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "Not Found"}))).into_response();
    };

    // Reject the verb before touching the body
    let method = match ProxyMethod::try_from(request.method()) {
        Ok(method) => method,
        Err(e) => return e.into_response(),
    };

    let inbound = match InboundRequest::from_request(request, method, state.max_body_size).await {
        Ok(inbound) => inbound,
        Err(e) => return e.into_response(),
    };

    match state.forwarder.forward(target, &path, &inbound).await {
        Ok(success) => success.into_response(),
        Err(e) => e.into_response(),
    }
}
