//! # Backend Service Surfaces
//!
//! Routers for the two backend services behind the gateway. Both share the
//! same informational endpoints (`/health`, `/healthz`, `/`, `/api/v1/status`),
//! built here from a [`ServiceInfo`].

pub mod auth;
pub mod core;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Version reported by the backend services' root endpoint
pub const SERVICE_API_VERSION: &str = "0.1.0";

/// Static identity of a backend service
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    /// Machine name reported by the health endpoints (`harborx-core`)
    pub name: &'static str,
    /// Human-readable name reported by `/`
    pub title: &'static str,
    /// Feature flags reported by `/api/v1/status`
    pub features: &'static [&'static str],
    /// Deployment environment, from configuration
    pub environment: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub timestamp: String,
    pub environment: String,
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub api_version: &'static str,
    pub status: &'static str,
    pub features: BTreeMap<&'static str, &'static str>,
}

/// Informational endpoints shared by every backend service
pub fn info_router(info: ServiceInfo) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/", get(root))
        .route("/api/v1/status", get(api_status))
        .with_state(Arc::new(info))
}

async fn health(State(info): State<Arc<ServiceInfo>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: info.name,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        environment: info.environment.clone(),
    })
}

async fn root(State(info): State<Arc<ServiceInfo>>) -> Json<RootResponse> {
    Json(RootResponse {
        service: info.title,
        version: SERVICE_API_VERSION,
        status: "running",
    })
}

async fn api_status(State(info): State<Arc<ServiceInfo>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        api_version: "v1",
        status: "operational",
        features: info.features.iter().map(|feature| (*feature, "enabled")).collect(),
    })
}
