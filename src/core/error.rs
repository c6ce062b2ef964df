//! # Error Handling Module
//!
//! Two error families live here:
//!
//! - [`GatewayError`] covers everything outside the proxy path: configuration
//!   loading, I/O, YAML parsing, HTTP client construction and internal failures.
//!   Binaries and service handlers return [`GatewayResult`].
//! - [`ProxyError`] is the closed taxonomy of forwarding failures. Every value of
//!   this enum is translated into exactly one client-visible `(status, body)` pair
//!   by `gateway::error_translator`, so adding a variant forces the translator to
//!   handle it at compile time.
//!
//! Cache failures have their own type (`caching::CacheError`) because most of them
//! are absorbed by the cache-aside resolver and never reach a client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Main result type used outside the proxy path
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors raised while configuring, starting or running a service
#[derive(Debug, Error, Clone)]
pub enum GatewayError {
    /// Configuration-related errors (invalid config, missing files, etc.)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// I/O errors (file operations, socket binding, etc.)
    #[error("I/O error: {message}")]
    Io { message: String },

    /// YAML parsing errors for configuration files
    #[error("YAML error: {message}")]
    Yaml { message: String },

    /// HTTP client construction errors
    #[error("HTTP client error: {message}")]
    HttpClient { message: String },

    /// Persistence collaborator failures
    #[error("Repository error: {message}")]
    Repository { message: String },

    /// Internal server errors for unexpected failures
    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl GatewayError {
    /// Create a configuration error with a custom message
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a repository error with a custom message
    pub fn repository<S: Into<String>>(message: S) -> Self {
        Self::Repository {
            message: message.into(),
        }
    }

    /// Create an internal error with a custom message
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// HTTP status code returned when this error reaches a client
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Repository { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Configuration { .. }
            | Self::Io { .. }
            | Self::Yaml { .. }
            | Self::HttpClient { .. }
            | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable name of the error category
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration_error",
            Self::Io { .. } => "io_error",
            Self::Yaml { .. } => "yaml_error",
            Self::HttpClient { .. } => "http_client_error",
            Self::Repository { .. } => "repository_error",
            Self::Internal { .. } => "internal_error",
        }
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for GatewayError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Yaml {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        Self::HttpClient {
            message: err.to_string(),
        }
    }
}

/// Service handlers return `GatewayResult`, so the error needs a response form.
///
/// Internal details stay in the logs: the client sees the same `error`/`message`
/// pair used everywhere else on the platform.
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::error!(error = %self, error_type = self.error_type(), "request failed");

        let body = match status {
            StatusCode::SERVICE_UNAVAILABLE => json!({
                "error": "Service Unavailable",
                "message": "The requested service is currently unavailable. Please try again later.",
            }),
            _ => json!({
                "error": "Internal Server Error",
                "message": "An unexpected error occurred.",
            }),
        };

        (status, Json(body)).into_response()
    }
}

/// Every way a forwarded request can fail
///
/// This is the `Failure` half of a proxy result; the `Success` half is
/// [`crate::core::types::ProxySuccess`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProxyError {
    /// Transport-level failure: connection refused, DNS failure, timeout, broken body
    #[error("Backend {target} unreachable: {reason}")]
    Unreachable { target: String, reason: String },

    /// The backend answered with a non-2xx status
    ///
    /// `body` holds the backend's payload when it parsed as JSON.
    #[error("Backend {target} returned HTTP {status}")]
    BackendHttp {
        target: String,
        status: u16,
        body: Option<serde_json::Value>,
    },

    /// Explicit signal that a backend cannot serve the request
    #[error("Service unavailable: {detail}")]
    ServiceUnavailable { detail: String },

    /// The inbound method is not one of GET, POST, PUT, DELETE
    #[error("Method not allowed: {method}")]
    MethodNotAllowed { method: String },

    /// The inbound body claimed to be JSON but could not be read or parsed
    #[error("Invalid request body: {reason}")]
    InvalidBody { reason: String },

    /// The inbound JSON body is larger than the configured limit
    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },
}

impl ProxyError {
    pub fn unreachable<T: Into<String>, R: Into<String>>(target: T, reason: R) -> Self {
        Self::Unreachable {
            target: target.into(),
            reason: reason.into(),
        }
    }

    pub fn service_unavailable<S: Into<String>>(detail: S) -> Self {
        Self::ServiceUnavailable {
            detail: detail.into(),
        }
    }

    pub fn method_not_allowed<S: Into<String>>(method: S) -> Self {
        Self::MethodNotAllowed {
            method: method.into(),
        }
    }

    /// Status code the client receives for this failure
    ///
    /// Backend statuses that are not valid HTTP codes fall back to 502.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unreachable { .. } | Self::ServiceUnavailable { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::BackendHttp { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::InvalidBody { .. } => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    /// Short machine-readable name of the failure kind, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unreachable { .. } => "unreachable",
            Self::BackendHttp { .. } => "backend_http_error",
            Self::ServiceUnavailable { .. } => "service_unavailable",
            Self::MethodNotAllowed { .. } => "method_not_allowed",
            Self::InvalidBody { .. } => "invalid_body",
            Self::PayloadTooLarge { .. } => "payload_too_large",
        }
    }
}
