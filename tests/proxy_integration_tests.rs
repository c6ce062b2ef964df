//! # Gateway Proxy Integration Tests
//!
//! Drives the full gateway router against mock auth and core backends:
//! - 2xx passthrough for GET, POST, PUT and DELETE
//! - method rejection before any outbound call
//! - unreachable backends and backend error passthrough
//! - header and body restrictions on the outbound request
//! - body size limits applied only to bodies that would be forwarded

use axum::http::StatusCode;
use axum_test::TestServer;
use harborx::core::types::BackendTarget;
use harborx::gateway::{build_router, GatewayState, RequestForwarder, RouteTable};
use harborx::observability::BackendHealthProber;
use harborx::protocols::CorsConfig;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{any, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn gateway_for(auth_url: &str, core_url: &str) -> TestServer {
    gateway_with_limit(auth_url, core_url, 1024 * 1024)
}

fn gateway_with_limit(auth_url: &str, core_url: &str, max_body_size: usize) -> TestServer {
    let state = GatewayState::new(
        RequestForwarder::new(Duration::from_secs(5)).unwrap(),
        BackendHealthProber::http(Duration::from_secs(1)).unwrap(),
        RouteTable::harborx(
            BackendTarget::new("auth", auth_url),
            BackendTarget::new("core", core_url),
        ),
        max_body_size,
    );
    TestServer::new(build_router(state, &CorsConfig::default())).unwrap()
}

async fn backends() -> (MockServer, MockServer) {
    (MockServer::start().await, MockServer::start().await)
}

#[tokio::test]
async fn test_get_passthrough_with_query() {
    let (auth, core) = backends().await;
    let listing = json!({"shipments": [], "total": 0});

    Mock::given(method("GET"))
        .and(path("/api/v1/shipments"))
        .and(query_param("status", "open"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing.clone()))
        .expect(1)
        .mount(&core)
        .await;

    let gateway = gateway_for(&auth.uri(), &core.uri());
    let response = gateway
        .get("/api/v1/shipments")
        .add_query_param("status", "open")
        .await;

    response.assert_status_ok();
    response.assert_json(&listing);
}

#[tokio::test]
async fn test_post_forwards_json_body() {
    let (auth, core) = backends().await;
    let credentials = json!({"email": "ops@harborx.io", "password": "secret"});

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .and(body_json(credentials.clone()))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"token": "abc"})))
        .expect(1)
        .mount(&auth)
        .await;

    let gateway = gateway_for(&auth.uri(), &core.uri());
    let response = gateway.post("/api/v1/auth/login").json(&credentials).await;

    // Backend 2xx codes are normalized to 200
    response.assert_status_ok();
    response.assert_json(&json!({"token": "abc"}));
}

#[tokio::test]
async fn test_put_and_delete_passthrough() {
    let (auth, core) = backends().await;

    Mock::given(method("PUT"))
        .and(path("/api/v1/shipments/42"))
        .and(body_json(json!({"status": "delivered"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "42", "status": "delivered"})))
        .expect(1)
        .mount(&core)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/shipments/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"deleted": true})))
        .expect(1)
        .mount(&core)
        .await;

    let gateway = gateway_for(&auth.uri(), &core.uri());

    let updated = gateway
        .put("/api/v1/shipments/42")
        .json(&json!({"status": "delivered"}))
        .await;
    updated.assert_status_ok();
    updated.assert_json(&json!({"id": "42", "status": "delivered"}));

    let deleted = gateway.delete("/api/v1/shipments/42").await;
    deleted.assert_status_ok();
    deleted.assert_json(&json!({"deleted": true}));
}

#[tokio::test]
async fn test_unsupported_method_is_rejected_without_outbound_call() {
    let (auth, core) = backends().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&core)
        .await;

    let gateway = gateway_for(&auth.uri(), &core.uri());
    let response = gateway.patch("/api/v1/shipments/42").json(&json!({"status": "lost"})).await;

    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
    response.assert_json(&json!({
        "error": "Method Not Allowed",
        "message": "Method PATCH is not allowed on this route.",
    }));
}

#[tokio::test]
async fn test_unreachable_backend_returns_communication_error() {
    let auth = MockServer::start().await;
    let gateway = gateway_for(&auth.uri(), "http://127.0.0.1:1");

    let response = gateway.get("/api/v1/shipments").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    response.assert_json(&json!({
        "error": "Service Communication Error",
        "message": "Unable to communicate with backend services.",
    }));
}

#[tokio::test]
async fn test_backend_error_body_passes_through() {
    let (auth, core) = backends().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "not found"})))
        .mount(&auth)
        .await;

    let gateway = gateway_for(&auth.uri(), &core.uri());
    let response = gateway.get("/api/v1/auth/me").await;

    response.assert_status(StatusCode::NOT_FOUND);
    response.assert_json(&json!({"detail": "not found"}));
}

#[tokio::test]
async fn test_backend_error_without_json_gets_generic_body() {
    let (auth, core) = backends().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("upstream exploded"))
        .mount(&core)
        .await;

    let gateway = gateway_for(&auth.uri(), &core.uri());
    let response = gateway.get("/api/v1/shipments").await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    response.assert_json(&json!({
        "error": "Backend Service Error",
        "message": "Backend service returned error: 502",
    }));
}

#[tokio::test]
async fn test_only_authorization_header_is_forwarded() {
    let (auth, core) = backends().await;

    let stripped = |request: &Request| {
        !request.headers.keys().any(|name| {
            let name = name.as_str();
            name.eq_ignore_ascii_case("x-custom") || name.eq_ignore_ascii_case("cookie")
        })
    };

    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .and(header("authorization", "Bearer token-123"))
        .and(stripped)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"user": "ops"})))
        .expect(1)
        .mount(&auth)
        .await;

    let gateway = gateway_for(&auth.uri(), &core.uri());
    let response = gateway
        .get("/api/v1/auth/me")
        .add_header("authorization".parse().unwrap(), "Bearer token-123".parse().unwrap())
        .add_header("x-custom".parse().unwrap(), "leak".parse().unwrap())
        .add_header("cookie".parse().unwrap(), "session=1".parse().unwrap())
        .await;

    response.assert_status_ok();
    response.assert_json(&json!({"user": "ops"}));
}

#[tokio::test]
async fn test_malformed_json_body_is_rejected() {
    let (auth, core) = backends().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&auth)
        .await;

    let gateway = gateway_for(&auth.uri(), &core.uri());
    let response = gateway
        .post("/api/v1/auth/login")
        .text("{not json")
        .content_type("application/json")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Invalid Request Body");
}

#[tokio::test]
async fn test_unknown_route_is_not_proxied() {
    let (auth, core) = backends().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&core)
        .await;

    let gateway = gateway_for(&auth.uri(), &core.uri());
    let response = gateway.get("/api/v1/invoices").await;

    response.assert_status(StatusCode::NOT_FOUND);
}

const OVERSIZED: &str = "a payload that is comfortably longer than sixteen bytes";

#[tokio::test]
async fn test_oversized_patch_is_method_not_allowed() {
    let (auth, core) = backends().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&core)
        .await;

    let gateway = gateway_with_limit(&auth.uri(), &core.uri(), 16);
    let response = gateway
        .patch("/api/v1/shipments/42")
        .text(OVERSIZED)
        .content_type("application/json")
        .await;

    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
    let body: Value = response.json();
    assert_eq!(body["error"], "Method Not Allowed");
}

#[tokio::test]
async fn test_oversized_plain_text_post_is_forwarded_without_body() {
    let (auth, core) = backends().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/shipments"))
        .and(|request: &Request| request.body.is_empty())
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "HX-1"})))
        .expect(1)
        .mount(&core)
        .await;

    let gateway = gateway_with_limit(&auth.uri(), &core.uri(), 16);
    let response = gateway
        .post("/api/v1/shipments")
        .text(OVERSIZED)
        .content_type("text/plain")
        .await;

    response.assert_status_ok();
    response.assert_json(&json!({"id": "HX-1"}));
}

#[tokio::test]
async fn test_oversized_json_post_is_rejected_without_outbound_call() {
    let (auth, core) = backends().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&core)
        .await;

    let gateway = gateway_with_limit(&auth.uri(), &core.uri(), 16);
    let response = gateway
        .put("/api/v1/shipments/42")
        .json(&json!({"status": "delivered", "note": "left at the loading dock"}))
        .await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    response.assert_json(&json!({
        "error": "Payload Too Large",
        "message": "Request body exceeds the 16 byte limit.",
    }));
}
