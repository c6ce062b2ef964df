//! # Structured Logging
//!
//! Installs the process-wide `tracing` subscriber. Output is JSON by default
//! (one object per line, with span context) or human-readable text for local
//! development. `RUST_LOG` directives take precedence over the configured level.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::core::error::GatewayResult;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Text,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            other => Err(format!("unknown log format '{}', expected json or text", other)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default level: trace, debug, info, warn or error
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

impl LogConfig {
    pub fn parsed_level(&self) -> Option<Level> {
        match self.level.to_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }

    pub(crate) fn validate_into(&self, errors: &mut Vec<String>) {
        if self.parsed_level().is_none() {
            errors.push(format!("Invalid log level: {}", self.level));
        }
    }
}

/// Install the global subscriber for `service`.
///
/// A second call (tests, embedded use) keeps the first subscriber.
pub fn init_logging(config: &LogConfig, service: &str) -> GatewayResult<()> {
    let level = config.parsed_level().unwrap_or(Level::INFO);
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
        .add_directive("hyper=info".parse().unwrap_or_else(|_| level.into()));

    let result = match config.format {
        LogFormat::Json => Registry::default()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_target(true),
            )
            .try_init(),
        LogFormat::Text => Registry::default()
            .with(env_filter)
            .with(fmt::layer().with_target(true))
            .try_init(),
    };

    if result.is_err() {
        warn!("Tracing subscriber already initialized, skipping initialization");
    }

    info!(service, version = env!("CARGO_PKG_VERSION"), "📊 logging initialized");
    Ok(())
}
