//! # Error Translation
//!
//! Turns every [`ProxyError`] into the single client-facing JSON contract.
//! The mapping is an exhaustive `match`; raw transport errors never appear in
//! a response body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use tracing::warn;

use crate::core::error::ProxyError;
use crate::core::types::ProxySuccess;

pub const SERVICE_UNAVAILABLE_MESSAGE: &str =
    "The requested service is currently unavailable. Please try again later.";

/// Status code and JSON body for a forwarding failure
pub fn translate(error: &ProxyError) -> (StatusCode, Value) {
    let status = error.status_code();
    let body = match error {
        ProxyError::Unreachable { .. } => json!({
            "error": "Service Communication Error",
            "message": "Unable to communicate with backend services.",
        }),
        ProxyError::BackendHttp { status: code, body, .. } => match body {
            Some(payload) => payload.clone(),
            None => json!({
                "error": "Backend Service Error",
                "message": format!("Backend service returned error: {}", code),
            }),
        },
        ProxyError::ServiceUnavailable { detail } => json!({
            "error": "Service Unavailable",
            "message": SERVICE_UNAVAILABLE_MESSAGE,
            "detail": detail,
        }),
        ProxyError::MethodNotAllowed { method } => json!({
            "error": "Method Not Allowed",
            "message": format!("Method {} is not allowed on this route.", method),
        }),
        ProxyError::InvalidBody { reason } => json!({
            "error": "Invalid Request Body",
            "message": format!("Request body is not valid JSON: {}", reason),
        }),
        ProxyError::PayloadTooLarge { limit } => json!({
            "error": "Payload Too Large",
            "message": format!("Request body exceeds the {} byte limit.", limit),
        }),
    };
    (status, body)
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, body) = translate(&self);
        warn!(kind = self.kind(), status = status.as_u16(), "Proxy request failed");
        (status, Json(body)).into_response()
    }
}

/// Successful proxies always answer 200 with the backend's body
impl IntoResponse for ProxySuccess {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self.body)).into_response()
    }
}
