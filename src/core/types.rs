//! # Core Types
//!
//! Data structures that flow through the gateway's forwarding path:
//! the static [`BackendTarget`] list, the captured [`InboundRequest`], the
//! restricted [`ProxyRequest`] that is actually sent to a backend, and the
//! [`ProxySuccess`] half of a proxy result.

use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use crate::core::error::ProxyError;

/// Content type that makes POST/PUT bodies eligible for forwarding.
/// Compared byte-for-byte with the inbound header value.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A downstream service the gateway forwards requests to
///
/// Loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendTarget {
    /// Short name used in logs and in the health report (`auth`, `core`)
    pub name: String,
    /// Scheme, host and optional port, without a trailing path
    pub base_url: String,
}

impl BackendTarget {
    pub fn new<N: Into<String>, U: Into<String>>(name: N, base_url: U) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
        }
    }

    /// Outbound URL for `path`.
    ///
    /// Plain concatenation: duplicate slashes are not normalized, so `path`
    /// must start with `/`.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// The four verbs the gateway proxies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProxyMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl ProxyMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// POST and PUT may carry a JSON body; GET and DELETE never do
    pub fn accepts_body(&self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }
}

impl fmt::Display for ProxyMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&Method> for ProxyMethod {
    type Error = ProxyError;

    fn try_from(method: &Method) -> Result<Self, Self::Error> {
        match method.as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            other => Err(ProxyError::method_not_allowed(other)),
        }
    }
}

/// An inbound client request, captured with its body already buffered
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl InboundRequest {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            uri,
            headers,
            body,
        }
    }

    /// Capture an axum request whose method has already been accepted.
    ///
    /// The body is buffered only when it can be forwarded: a POST or PUT with
    /// a content type of exactly `application/json`. Any other body is dropped
    /// unread. The buffering limit comes from the router's `DefaultBodyLimit`
    /// layer; `max_body_size` is reported back when that limit is exceeded.
    pub async fn from_request(
        request: Request,
        method: ProxyMethod,
        max_body_size: usize,
    ) -> Result<Self, ProxyError> {
        let forwards_body = method.accepts_body()
            && request
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                == Some(JSON_CONTENT_TYPE);

        let http_method = request.method().clone();
        let uri = request.uri().clone();
        let headers = request.headers().clone();

        if !forwards_body {
            return Ok(Self::new(http_method, uri, headers, Bytes::new()));
        }

        let body = Bytes::from_request(request, &()).await.map_err(|rejection| {
            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ProxyError::PayloadTooLarge { limit: max_body_size }
            } else {
                ProxyError::InvalidBody {
                    reason: rejection.body_text(),
                }
            }
        })?;

        Ok(Self::new(http_method, uri, headers, body))
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Decoded query parameters in the order they appeared
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.uri
            .query()
            .map(|query| {
                url::form_urlencoded::parse(query.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Raw `content-type` header, if present and valid UTF-8
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }
}

/// The request actually sent to a backend
///
/// Only the `authorization` header survives; hop-by-hop and cache-control
/// headers from the client never reach a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyRequest {
    pub method: ProxyMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<serde_json::Value>,
}

impl ProxyRequest {
    /// Build the outbound request for `path` from an inbound request.
    ///
    /// Fails with `MethodNotAllowed` for any verb other than GET, POST, PUT and
    /// DELETE, and with `InvalidBody` when a JSON body does not parse.
    pub fn from_inbound<P: Into<String>>(path: P, inbound: &InboundRequest) -> Result<Self, ProxyError> {
        let method = ProxyMethod::try_from(&inbound.method)?;

        let mut headers = BTreeMap::new();
        if let Some(value) = inbound.headers.get(header::AUTHORIZATION) {
            match value.to_str() {
                Ok(value) => {
                    headers.insert(header::AUTHORIZATION.as_str().to_string(), value.to_string());
                }
                Err(_) => debug!("dropping non-UTF-8 authorization header"),
            }
        }

        let query = match method {
            ProxyMethod::Get => inbound.query_pairs(),
            _ => Vec::new(),
        };

        // Any other content type, including `application/json; charset=utf-8`,
        // is forwarded without a body.
        let body = if method.accepts_body() && inbound.content_type() == Some(JSON_CONTENT_TYPE) {
            if inbound.body.is_empty() {
                None
            } else {
                let value = serde_json::from_slice(&inbound.body).map_err(|e| ProxyError::InvalidBody {
                    reason: e.to_string(),
                })?;
                Some(value)
            }
        } else {
            None
        };

        Ok(Self {
            method,
            path: path.into(),
            query,
            headers,
            body,
        })
    }
}

/// The success half of a proxy result
#[derive(Debug, Clone, PartialEq)]
pub struct ProxySuccess {
    /// The backend's 2xx status
    pub status: u16,
    /// The backend's JSON body, untouched
    pub body: serde_json::Value,
}

/// Outcome of one forwarded request
pub type ProxyResult = Result<ProxySuccess, ProxyError>;
