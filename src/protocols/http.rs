//! # HTTP Protocol Helpers
//!
//! Cross-origin policy shared by the gateway and the backend services.
//!
//! The gateway trusts a fixed list of browser origins and lets them send
//! credentials. The backend services are configured from `CORS_ORIGINS`, which
//! defaults to `*`. A wildcard origin cannot be combined with credentials, so a
//! `*` entry switches the layer into anonymous mode.

use axum::http::HeaderValue;
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tracing::warn;

/// Wildcard origin marker
pub const ANY_ORIGIN: &str = "*";

/// CORS configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins, or a single `*`
    pub allowed_origins: Vec<String>,
    /// Allow cookies and authorization headers on cross-origin requests
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![ANY_ORIGIN.to_string()],
            allow_credentials: true,
        }
    }
}

impl CorsConfig {
    /// Policy for a service configured with a plain origin list
    pub fn from_origins(origins: &[String]) -> Self {
        Self {
            allowed_origins: origins.to_vec(),
            allow_credentials: true,
        }
    }

    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == ANY_ORIGIN)
    }
}

/// Build the tower-http layer for `config`.
///
/// Methods and request headers are mirrored from the preflight, which is how
/// "allow everything" is expressed when credentials are on. Origins that are
/// not valid header values are skipped with a warning.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    if config.allows_any_origin() {
        if config.allow_credentials {
            warn!("CORS wildcard origin configured; credentials will not be allowed");
        }
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Skipping invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(config.allow_credentials)
}
