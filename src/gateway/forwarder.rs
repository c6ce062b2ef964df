//! # Request Forwarder
//!
//! Sends one restricted [`ProxyRequest`] to a backend and classifies the
//! outcome. Exactly one outbound call is made per forwarded request: there is
//! no retry, and redirects are handed back to the caller as backend statuses.

use reqwest::redirect::Policy;
use reqwest::Client as HttpClient;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::core::error::{GatewayResult, ProxyError};
use crate::core::types::{BackendTarget, InboundRequest, ProxyMethod, ProxyRequest, ProxyResult, ProxySuccess};

/// Detail attached to a 2xx response whose body is not JSON
pub const INVALID_JSON_DETAIL: &str = "Invalid JSON response from backend service";

/// HTTP client wrapper shared by every proxy route
#[derive(Debug, Clone)]
pub struct RequestForwarder {
    client: HttpClient,
    timeout: Duration,
}

impl RequestForwarder {
    /// Create a forwarder whose outbound calls time out after `timeout`
    pub fn new(timeout: Duration) -> GatewayResult<Self> {
        let client = HttpClient::builder().redirect(Policy::none()).build()?;
        Ok(Self { client, timeout })
    }

    /// Forward `inbound` to `target` at `path`.
    ///
    /// Unsupported methods and malformed JSON bodies fail here, before any
    /// network call is made.
    pub async fn forward(&self, target: &BackendTarget, path: &str, inbound: &InboundRequest) -> ProxyResult {
        let request = ProxyRequest::from_inbound(path, inbound)?;
        self.send(target, request).await
    }

    /// Send an already restricted request
    pub async fn send(&self, target: &BackendTarget, request: ProxyRequest) -> ProxyResult {
        let url = target.url_for(&request.path);
        let start_time = Instant::now();

        let mut builder = match request.method {
            ProxyMethod::Get => self.client.get(&url),
            ProxyMethod::Post => self.client.post(&url),
            ProxyMethod::Put => self.client.put(&url),
            ProxyMethod::Delete => self.client.delete(&url),
        };

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!(
            method = %request.method,
            backend = %target.name,
            url = %url,
            has_body = request.body.is_some(),
            "Forwarding request"
        );

        let response = builder.timeout(self.timeout).send().await.map_err(|e| {
            error!(
                method = %request.method,
                backend = %target.name,
                url = %url,
                timeout = e.is_timeout(),
                error = %e,
                "Backend request failed"
            );
            ProxyError::unreachable(&target.name, e.to_string())
        })?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| {
            error!(backend = %target.name, url = %url, error = %e, "Failed to read backend response body");
            ProxyError::unreachable(&target.name, e.to_string())
        })?;

        info!(
            method = %request.method,
            backend = %target.name,
            path = %request.path,
            status,
            duration_ms = start_time.elapsed().as_millis() as u64,
            "Backend responded"
        );

        if (200..300).contains(&status) {
            let body = if body.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&body).map_err(|e| {
                    error!(backend = %target.name, url = %url, status, error = %e, "Backend returned non-JSON success body");
                    ProxyError::service_unavailable(INVALID_JSON_DETAIL)
                })?
            };
            return Ok(ProxySuccess { status, body });
        }

        let body = serde_json::from_slice::<Value>(&body).ok();
        if body.is_none() {
            warn!(backend = %target.name, status, "Backend error response is not JSON");
        }
        Err(ProxyError::BackendHttp {
            target: target.name.clone(),
            status,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::{HeaderMap, Method};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn get(uri: &str) -> InboundRequest {
        InboundRequest::new(Method::GET, uri.parse().unwrap(), HeaderMap::new(), Bytes::new())
    }

    #[tokio::test]
    async fn test_empty_success_body_becomes_null() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/shipments/1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let forwarder = RequestForwarder::new(Duration::from_secs(5)).unwrap();
        let target = BackendTarget::new("core", server.uri());
        let inbound = InboundRequest::new(
            Method::DELETE,
            "/api/v1/shipments/1".parse().unwrap(),
            HeaderMap::new(),
            Bytes::new(),
        );

        let success = forwarder.forward(&target, "/api/v1/shipments/1", &inbound).await.unwrap();
        assert_eq!(success.status, 204);
        assert_eq!(success.body, Value::Null);
    }

    #[tokio::test]
    async fn test_non_json_success_is_service_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let forwarder = RequestForwarder::new(Duration::from_secs(5)).unwrap();
        let target = BackendTarget::new("core", server.uri());
        let error = forwarder.forward(&target, "/api/v1/shipments", &get("/api/v1/shipments")).await.unwrap_err();
        assert_eq!(error, ProxyError::service_unavailable(INVALID_JSON_DETAIL));
    }

    #[tokio::test]
    async fn test_error_status_keeps_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({"detail": "bad id"})))
            .mount(&server)
            .await;

        let forwarder = RequestForwarder::new(Duration::from_secs(5)).unwrap();
        let target = BackendTarget::new("core", server.uri());
        let error = forwarder.forward(&target, "/api/v1/shipments/x", &get("/api/v1/shipments/x")).await.unwrap_err();
        assert_eq!(
            error,
            ProxyError::BackendHttp {
                target: "core".to_string(),
                status: 422,
                body: Some(json!({"detail": "bad id"})),
            }
        );
    }

    #[tokio::test]
    async fn test_slow_backend_times_out_as_unreachable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let forwarder = RequestForwarder::new(Duration::from_millis(100)).unwrap();
        let target = BackendTarget::new("core", server.uri());
        let error = forwarder.forward(&target, "/api/v1/shipments", &get("/api/v1/shipments")).await.unwrap_err();
        assert!(matches!(error, ProxyError::Unreachable { ref target, .. } if target == "core"));
    }

    #[tokio::test]
    async fn test_redirect_is_not_followed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(307).insert_header("location", "/elsewhere"))
            .mount(&server)
            .await;

        let forwarder = RequestForwarder::new(Duration::from_secs(5)).unwrap();
        let target = BackendTarget::new("auth", server.uri());
        let error = forwarder.forward(&target, "/api/v1/auth/me", &get("/api/v1/auth/me")).await.unwrap_err();
        assert!(matches!(error, ProxyError::BackendHttp { status: 307, body: None, .. }));
    }
}
