//! # Backend Health Probing
//!
//! On-demand health snapshot of the gateway's backends. Every call to
//! [`BackendHealthProber::probe`] issues one `GET {base_url}/health` per target,
//! all concurrently, and folds the per-backend results into a [`HealthStatus`].
//! Nothing is cached between calls.
//!
//! ## Key Features
//! - Pluggable probes through the [`HealthProbe`] trait
//! - Per-probe timeout so one slow backend cannot stall the report
//! - A failing probe never aborts the others
//!
//! ## Rust Concepts Used
//! - `async_trait` for async methods in traits
//! - `Arc<dyn Trait>` to share the probe across request tasks
//! - `futures::future::join_all` to run probes concurrently

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::{redirect::Policy, Client as HttpClient};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::core::error::GatewayResult;
use crate::core::types::BackendTarget;

/// Health of a single backend as seen by one probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendStatus {
    /// The backend answered `/health` with 200
    Healthy,
    /// The backend answered with any other status
    Unhealthy,
    /// Connection failure, DNS failure or timeout
    Unreachable,
}

/// Aggregate health of the gateway's backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Healthy,
    Degraded,
}

/// Snapshot produced by one probe round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// `healthy` iff every backend is healthy
    pub status: OverallStatus,
    /// Backend name to its status
    pub backend_services: BTreeMap<String, BackendStatus>,
}

impl HealthStatus {
    /// Aggregate per-backend results
    ///
    /// An empty set of backends is reported as healthy.
    pub fn from_results<I>(results: I) -> Self
    where
        I: IntoIterator<Item = (String, BackendStatus)>,
    {
        let backend_services: BTreeMap<String, BackendStatus> = results.into_iter().collect();
        let status = if backend_services
            .values()
            .all(|status| *status == BackendStatus::Healthy)
        {
            OverallStatus::Healthy
        } else {
            OverallStatus::Degraded
        };

        Self {
            status,
            backend_services,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == OverallStatus::Healthy
    }
}

/// Trait for health check probes
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Check one backend; never fails, an error is itself a status
    async fn check(&self, target: &BackendTarget) -> BackendStatus;

    /// Get the probe type name
    fn probe_type(&self) -> &'static str;
}

/// Path probed on every backend
pub const HEALTH_PATH: &str = "/health";

/// HTTP health check probe implementation
pub struct HttpHealthProbe {
    client: HttpClient,
    timeout: Duration,
}

impl HttpHealthProbe {
    /// Create a new HTTP health probe with a per-check timeout.
    ///
    /// Redirects are not followed: a 3xx from `/health` counts as unhealthy.
    pub fn new(timeout: Duration) -> GatewayResult<Self> {
        let client = HttpClient::builder().redirect(Policy::none()).build()?;
        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn check(&self, target: &BackendTarget) -> BackendStatus {
        let url = target.url_for(HEALTH_PATH);
        let start_time = Instant::now();

        let result = timeout(self.timeout, self.client.get(&url).send()).await;
        let duration = start_time.elapsed();

        match result {
            Ok(Ok(response)) if response.status().as_u16() == 200 => {
                debug!(backend = %target.name, ?duration, "Health check passed");
                BackendStatus::Healthy
            }
            Ok(Ok(response)) => {
                warn!(
                    backend = %target.name,
                    status = response.status().as_u16(),
                    ?duration,
                    "Health check returned non-200 status"
                );
                BackendStatus::Unhealthy
            }
            Ok(Err(e)) => {
                warn!(backend = %target.name, url = %url, error = %e, "Health check request failed");
                BackendStatus::Unreachable
            }
            Err(_) => {
                warn!(backend = %target.name, url = %url, timeout = ?self.timeout, "Health check timed out");
                BackendStatus::Unreachable
            }
        }
    }

    fn probe_type(&self) -> &'static str {
        "http"
    }
}

/// Runs one probe per backend and aggregates the results
#[derive(Clone)]
pub struct BackendHealthProber {
    probe: Arc<dyn HealthProbe>,
}

impl BackendHealthProber {
    pub fn new(probe: Arc<dyn HealthProbe>) -> Self {
        Self { probe }
    }

    /// Prober backed by [`HttpHealthProbe`]
    pub fn http(timeout: Duration) -> GatewayResult<Self> {
        Ok(Self::new(Arc::new(HttpHealthProbe::new(timeout)?)))
    }

    pub async fn probe(&self, targets: &[BackendTarget]) -> HealthStatus {
        let checks = targets.iter().map(|target| {
            let probe = Arc::clone(&self.probe);
            async move { (target.name.clone(), probe.check(target).await) }
        });

        let status = HealthStatus::from_results(join_all(checks).await);
        debug!(
            probe_type = self.probe.probe_type(),
            healthy = status.is_healthy(),
            "Backend health probe complete"
        );
        status
    }
}

impl std::fmt::Debug for BackendHealthProber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendHealthProber")
            .field("probe_type", &self.probe.probe_type())
            .finish()
    }
}
