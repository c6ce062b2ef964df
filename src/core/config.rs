//! # Configuration Module
//!
//! Configuration for the three services. Each configuration is loaded once at
//! process start and never reloaded:
//!
//! 1. start from the YAML file named by `HARBORX_CONFIG` (or from defaults when
//!    the variable is unset),
//! 2. apply environment variable overrides,
//! 3. validate, collecting every problem into a single error.
//!
//! Environment variable names match the ones the platform's deployment files
//! already use (`AUTH_SERVICE_URL`, `REDIS_URL`, `CORS_ORIGINS`, `PORT`, ...).
//! Process-specific knobs use the `HARBORX_` prefix.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::core::error::{GatewayError, GatewayResult};
use crate::core::types::BackendTarget;
use crate::observability::logging::{LogConfig, LogFormat};
use crate::protocols::http::CorsConfig;

/// Environment variable naming an optional YAML configuration file
pub const CONFIG_PATH_ENV: &str = "HARBORX_CONFIG";

/// Origin the gateway always allows alongside the configured frontend
pub const LOCAL_FRONTEND_ORIGIN: &str = "http://localhost:3000";

/// Source of override values, normally the process environment
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Behaviour shared by every service configuration
pub trait ServiceConfig: DeserializeOwned + Default + Sized {
    /// Apply overrides read through `lookup`
    fn apply_overrides(&mut self, lookup: EnvLookup<'_>) -> GatewayResult<()>;

    /// Check the configuration, reporting every problem at once
    fn validate(&self) -> GatewayResult<()>;

    /// Apply overrides from the process environment
    fn apply_env_overrides(&mut self) -> GatewayResult<()> {
        self.apply_overrides(&|key| std::env::var(key).ok())
    }
}

/// Load a configuration from a YAML file, then apply env overrides and validate
pub async fn load_from_file<C: ServiceConfig, P: AsRef<Path>>(path: P) -> GatewayResult<C> {
    load_from_file_with(path, &|key| std::env::var(key).ok()).await
}

/// Load a configuration from a YAML file with overrides read through `lookup`
pub async fn load_from_file_with<C: ServiceConfig, P: AsRef<Path>>(
    path: P,
    lookup: EnvLookup<'_>,
) -> GatewayResult<C> {
    let content = tokio::fs::read_to_string(path.as_ref())
        .await
        .map_err(|e| GatewayError::config(format!("Failed to read config file: {}", e)))?;

    let mut config: C = serde_yaml::from_str(&content)?;

    config.apply_overrides(lookup)?;
    config.validate()?;
    Ok(config)
}

/// Build a configuration from defaults and the process environment only
pub fn from_env<C: ServiceConfig>() -> GatewayResult<C> {
    let mut config = C::default();
    config.apply_env_overrides()?;
    config.validate()?;
    Ok(config)
}

/// Load from `HARBORX_CONFIG` when set, otherwise from the environment
pub async fn load<C: ServiceConfig>() -> GatewayResult<C> {
    match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) if !path.is_empty() => load_from_file(PathBuf::from(path)).await,
        _ => from_env(),
    }
}

/// Listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_address: String,

    /// Port to listen on
    pub port: u16,

    /// Largest request body buffered before forwarding, in bytes
    pub max_request_size: usize,
}

impl ServerConfig {
    fn with_port(port: u16) -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port,
            max_request_size: 16 * 1024 * 1024,
        }
    }

    pub fn socket_addr(&self) -> GatewayResult<SocketAddr> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .map_err(|e| GatewayError::config(format!("Invalid bind address: {}", e)))
    }

    fn validate_into(&self, errors: &mut Vec<String>) {
        if self.bind_address.is_empty() {
            errors.push("bind_address cannot be empty".to_string());
        } else if self.socket_addr().is_err() {
            errors.push(format!("bind_address '{}' is not a valid IP address", self.bind_address));
        }
        if self.max_request_size == 0 {
            errors.push("max_request_size must be greater than 0".to_string());
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::with_port(8000)
    }
}

/// Base URLs of the services the gateway fronts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendsConfig {
    pub auth_service_url: String,
    pub core_service_url: String,
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            auth_service_url: "http://localhost:8001".to_string(),
            core_service_url: "http://localhost:8002".to_string(),
        }
    }
}

/// Outbound call timeouts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Timeout for one forwarded request
    #[serde(with = "humantime_serde")]
    pub forward_timeout: Duration,

    /// Timeout for one backend health probe
    #[serde(with = "humantime_serde")]
    pub health_check_timeout: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            forward_timeout: Duration::from_secs(30),
            health_check_timeout: Duration::from_secs(5),
        }
    }
}

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub server: ServerConfig,
    pub backends: BackendsConfig,
    /// Public URL of the web frontend, allowed as a CORS origin
    pub frontend_url: String,
    pub environment: String,
    pub timeouts: TimeoutConfig,
    pub logging: LogConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::with_port(8000),
            backends: BackendsConfig::default(),
            frontend_url: LOCAL_FRONTEND_ORIGIN.to_string(),
            environment: "development".to_string(),
            timeouts: TimeoutConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl GatewayConfig {
    pub fn auth_target(&self) -> BackendTarget {
        BackendTarget::new("auth", self.backends.auth_service_url.clone())
    }

    pub fn core_target(&self) -> BackendTarget {
        BackendTarget::new("core", self.backends.core_service_url.clone())
    }

    /// CORS policy: the configured frontend plus the local development origin,
    /// with credentials
    pub fn cors(&self) -> CorsConfig {
        let mut allowed_origins = vec![self.frontend_url.clone()];
        if self.frontend_url != LOCAL_FRONTEND_ORIGIN {
            allowed_origins.push(LOCAL_FRONTEND_ORIGIN.to_string());
        }
        CorsConfig {
            allowed_origins,
            allow_credentials: true,
        }
    }
}

impl ServiceConfig for GatewayConfig {
    fn apply_overrides(&mut self, lookup: EnvLookup<'_>) -> GatewayResult<()> {
        if let Some(url) = lookup("AUTH_SERVICE_URL") {
            self.backends.auth_service_url = url;
        }
        if let Some(url) = lookup("CORE_SERVICE_URL") {
            self.backends.core_service_url = url;
        }
        if let Some(url) = lookup("FRONTEND_URL") {
            self.frontend_url = url;
        }
        if let Some(timeout) = lookup("HARBORX_FORWARD_TIMEOUT") {
            self.timeouts.forward_timeout = parse_duration("HARBORX_FORWARD_TIMEOUT", &timeout)?;
        }
        if let Some(timeout) = lookup("HARBORX_HEALTH_CHECK_TIMEOUT") {
            self.timeouts.health_check_timeout =
                parse_duration("HARBORX_HEALTH_CHECK_TIMEOUT", &timeout)?;
        }
        apply_common_overrides(
            lookup,
            &mut self.server,
            &mut self.environment,
            &mut self.logging,
        )
    }

    fn validate(&self) -> GatewayResult<()> {
        let mut errors = Vec::new();

        self.server.validate_into(&mut errors);
        validate_http_url("auth_service_url", &self.backends.auth_service_url, &mut errors);
        validate_http_url("core_service_url", &self.backends.core_service_url, &mut errors);
        validate_http_url("frontend_url", &self.frontend_url, &mut errors);

        if self.timeouts.forward_timeout.is_zero() {
            errors.push("forward_timeout must be greater than 0".to_string());
        }
        if self.timeouts.health_check_timeout.is_zero() {
            errors.push("health_check_timeout must be greater than 0".to_string());
        }
        self.logging.validate_into(&mut errors);

        finish_validation(errors)
    }
}

/// Cache settings of the core service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Connection string: `redis://...` or `memory://` for an in-process store
    pub url: String,

    /// Lifetime of the cached shipment list
    #[serde(with = "humantime_serde")]
    pub shipments_ttl: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            shipments_ttl: Duration::from_secs(30),
        }
    }
}

/// Core (shipments) service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreServiceConfig {
    pub server: ServerConfig,
    pub cache: CacheSettings,
    /// Allowed CORS origins; `*` allows any origin without credentials
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub logging: LogConfig,
}

impl Default for CoreServiceConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::with_port(8002),
            cache: CacheSettings::default(),
            cors_origins: vec!["*".to_string()],
            environment: "development".to_string(),
            logging: LogConfig::default(),
        }
    }
}

impl CoreServiceConfig {
    pub fn cors(&self) -> CorsConfig {
        CorsConfig::from_origins(&self.cors_origins)
    }
}

impl ServiceConfig for CoreServiceConfig {
    fn apply_overrides(&mut self, lookup: EnvLookup<'_>) -> GatewayResult<()> {
        if let Some(url) = lookup("REDIS_URL") {
            self.cache.url = url;
        }
        if let Some(ttl) = lookup("HARBORX_CACHE_TTL") {
            self.cache.shipments_ttl = parse_duration("HARBORX_CACHE_TTL", &ttl)?;
        }
        if let Some(origins) = lookup("CORS_ORIGINS") {
            self.cors_origins = split_origins(&origins);
        }
        apply_common_overrides(
            lookup,
            &mut self.server,
            &mut self.environment,
            &mut self.logging,
        )
    }

    fn validate(&self) -> GatewayResult<()> {
        let mut errors = Vec::new();

        self.server.validate_into(&mut errors);
        if self.cache.url.is_empty() {
            errors.push("cache url cannot be empty".to_string());
        }
        if self.cache.shipments_ttl.as_secs() == 0 {
            errors.push("shipments_ttl must be at least one second".to_string());
        }
        if self.cors_origins.is_empty() {
            errors.push("cors_origins cannot be empty".to_string());
        }
        self.logging.validate_into(&mut errors);

        finish_validation(errors)
    }
}

/// Auth service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthServiceConfig {
    pub server: ServerConfig,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub logging: LogConfig,
}

impl Default for AuthServiceConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::with_port(8001),
            cors_origins: vec!["*".to_string()],
            environment: "development".to_string(),
            logging: LogConfig::default(),
        }
    }
}

impl AuthServiceConfig {
    pub fn cors(&self) -> CorsConfig {
        CorsConfig::from_origins(&self.cors_origins)
    }
}

impl ServiceConfig for AuthServiceConfig {
    fn apply_overrides(&mut self, lookup: EnvLookup<'_>) -> GatewayResult<()> {
        if let Some(origins) = lookup("CORS_ORIGINS") {
            self.cors_origins = split_origins(&origins);
        }
        apply_common_overrides(
            lookup,
            &mut self.server,
            &mut self.environment,
            &mut self.logging,
        )
    }

    fn validate(&self) -> GatewayResult<()> {
        let mut errors = Vec::new();

        self.server.validate_into(&mut errors);
        if self.cors_origins.is_empty() {
            errors.push("cors_origins cannot be empty".to_string());
        }
        self.logging.validate_into(&mut errors);

        finish_validation(errors)
    }
}

fn apply_common_overrides(
    lookup: EnvLookup<'_>,
    server: &mut ServerConfig,
    environment: &mut String,
    logging: &mut LogConfig,
) -> GatewayResult<()> {
    if let Some(port) = lookup("PORT") {
        server.port = port
            .parse()
            .map_err(|e| GatewayError::config(format!("Invalid PORT: {}", e)))?;
    }
    if let Some(address) = lookup("HARBORX_BIND_ADDRESS") {
        server.bind_address = address;
    }
    if let Some(env) = lookup("ENVIRONMENT") {
        *environment = env;
    }
    if let Some(level) = lookup("HARBORX_LOG_LEVEL") {
        logging.level = level;
    }
    if let Some(format) = lookup("HARBORX_LOG_FORMAT") {
        logging.format = format
            .parse::<LogFormat>()
            .map_err(|e| GatewayError::config(format!("Invalid HARBORX_LOG_FORMAT: {}", e)))?;
    }
    Ok(())
}

fn parse_duration(name: &str, value: &str) -> GatewayResult<Duration> {
    humantime::parse_duration(value)
        .map_err(|e| GatewayError::config(format!("Invalid {}: {}", name, e)))
}

fn split_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

fn validate_http_url(field: &str, value: &str, errors: &mut Vec<String>) {
    match Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(format!("{} must use http or https, got '{}'", field, url.scheme())),
        Err(e) => errors.push(format!("{} '{}' is not a valid URL: {}", field, value, e)),
    }
}

fn finish_validation(errors: Vec<String>) -> GatewayResult<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(GatewayError::config(format!(
            "Configuration validation failed:\n{}",
            errors.join("\n")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(GatewayConfig::default().validate().is_ok());
        assert!(CoreServiceConfig::default().validate().is_ok());
        assert!(AuthServiceConfig::default().validate().is_ok());
    }

    #[test]
    fn test_gateway_env_overrides() {
        let mut config = GatewayConfig::default();
        let lookup = lookup_from(&[
            ("AUTH_SERVICE_URL", "http://auth:8001"),
            ("CORE_SERVICE_URL", "http://core:8000"),
            ("FRONTEND_URL", "https://app.harborx.io"),
            ("PORT", "9000"),
            ("HARBORX_FORWARD_TIMEOUT", "10s"),
            ("HARBORX_LOG_FORMAT", "text"),
        ]);
        config.apply_overrides(&lookup).unwrap();

        assert_eq!(config.auth_target(), BackendTarget::new("auth", "http://auth:8001"));
        assert_eq!(config.core_target(), BackendTarget::new("core", "http://core:8000"));
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.timeouts.forward_timeout, Duration::from_secs(10));
        assert_eq!(config.logging.format, LogFormat::Text);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_port_override_is_rejected() {
        let mut config = GatewayConfig::default();
        let lookup = lookup_from(&[("PORT", "eighty")]);
        assert!(config.apply_overrides(&lookup).is_err());
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.backends.auth_service_url = "not a url".to_string();
        config.backends.core_service_url = "ftp://core".to_string();
        config.timeouts.forward_timeout = Duration::ZERO;

        let message = config.validate().unwrap_err().to_string();
        assert!(message.contains("auth_service_url"));
        assert!(message.contains("core_service_url must use http or https"));
        assert!(message.contains("forward_timeout"));
    }

    #[test]
    fn test_gateway_cors_includes_local_frontend_once() {
        let config = GatewayConfig::default();
        assert_eq!(config.cors().allowed_origins, vec![LOCAL_FRONTEND_ORIGIN.to_string()]);

        let mut config = GatewayConfig::default();
        config.frontend_url = "https://app.harborx.io".to_string();
        assert_eq!(
            config.cors().allowed_origins,
            vec!["https://app.harborx.io".to_string(), LOCAL_FRONTEND_ORIGIN.to_string()]
        );
    }

    #[test]
    fn test_core_cors_origins_are_split() {
        let mut config = CoreServiceConfig::default();
        let lookup = lookup_from(&[
            ("CORS_ORIGINS", "http://a.test, http://b.test,"),
            ("REDIS_URL", "redis://cache:6379/0"),
        ]);
        config.apply_overrides(&lookup).unwrap();
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(config.cache.url, "redis://cache:6379/0");
    }

    #[tokio::test]
    async fn test_load_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "server:\n  max_request_size: 1024\nbackends:\n  auth_service_url: http://auth.internal:8001\ntimeouts:\n  forward_timeout: 15s\n  health_check_timeout: 2s\n"
        )
        .unwrap();

        let config: GatewayConfig = load_from_file_with(file.path(), &lookup_from(&[])).await.unwrap();
        assert_eq!(config.server.max_request_size, 1024);
        assert_eq!(config.backends.auth_service_url, "http://auth.internal:8001");
        assert_eq!(config.timeouts.forward_timeout, Duration::from_secs(15));
        assert_eq!(config.timeouts.health_check_timeout, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_yaml_file_overrides_come_from_lookup() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  port: 9100\n").unwrap();

        let lookup = lookup_from(&[("PORT", "9200"), ("CORE_SERVICE_URL", "http://core.internal:8002")]);
        let config: GatewayConfig = load_from_file_with(file.path(), &lookup).await.unwrap();
        assert_eq!(config.server.port, 9200);
        assert_eq!(config.backends.core_service_url, "http://core.internal:8002");
    }

    #[tokio::test]
    async fn test_malformed_yaml_is_a_yaml_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server: [unterminated").unwrap();

        let error = load_from_file_with::<GatewayConfig, _>(file.path(), &lookup_from(&[]))
            .await
            .unwrap_err();
        assert!(matches!(error, GatewayError::Yaml { .. }));
    }
}
