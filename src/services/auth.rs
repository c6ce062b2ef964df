//! Auth service surface.
//!
//! Token issuance and verification are not implemented yet; the routes exist
//! so the gateway's auth prefix has a real backend to talk to.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use super::{info_router, ServiceInfo};

pub const SERVICE_NAME: &str = "harborx-auth";

pub fn service_info(environment: String) -> ServiceInfo {
    ServiceInfo {
        name: SERVICE_NAME,
        title: "HarborX Auth Service",
        features: &["authentication", "authorization"],
        environment,
    }
}

pub fn router(environment: String) -> Router {
    info_router(service_info(environment))
        .route("/api/v1/auth/login", post(not_implemented))
        .route("/api/v1/auth/me", get(not_implemented))
        .route("/api/v1/auth/verify", post(not_implemented))
}

async fn not_implemented() -> impl IntoResponse {
    (
        StatusCode::NOT_IMPLEMENTED,
        Json(json!({
            "error": "Not Implemented",
            "message": "Authentication is not available yet.",
        })),
    )
}
