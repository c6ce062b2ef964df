//! # Core Service
//!
//! Shipment operations. The list endpoint reads through the cache-aside
//! resolver, so repeated reads within the TTL never touch the repository.

use async_trait::async_trait;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{info_router, ServiceInfo};
use crate::caching::CacheAsideResolver;
use crate::core::error::{GatewayError, GatewayResult};

pub const SERVICE_NAME: &str = "harborx-core";

/// Cache key for the full shipment listing
pub const SHIPMENTS_LIST_KEY: &str = "shipments:list";

/// Default lifetime of the cached listing, in seconds
pub const SHIPMENTS_LIST_TTL_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: String,
    pub tracking_number: String,
    pub origin: String,
    pub destination: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl Shipment {
    /// New shipment with a generated id, created now
    pub fn new<T, O, D>(tracking_number: T, origin: O, destination: D) -> Self
    where
        T: Into<String>,
        O: Into<String>,
        D: Into<String>,
    {
        Self {
            id: Uuid::new_v4().to_string(),
            tracking_number: tracking_number.into(),
            origin: origin.into(),
            destination: destination.into(),
            status: "pending".to_string(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentListResponse {
    pub shipments: Vec<Shipment>,
    pub total: usize,
}

impl From<Vec<Shipment>> for ShipmentListResponse {
    fn from(shipments: Vec<Shipment>) -> Self {
        Self {
            total: shipments.len(),
            shipments,
        }
    }
}

/// Persistence collaborator for shipments
#[async_trait]
pub trait ShipmentRepository: Send + Sync {
    async fn list(&self) -> GatewayResult<Vec<Shipment>>;
}

/// Repository held entirely in process memory
#[derive(Debug, Default)]
pub struct InMemoryShipmentRepository {
    shipments: RwLock<Vec<Shipment>>,
}

impl InMemoryShipmentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shipments(shipments: Vec<Shipment>) -> Self {
        Self {
            shipments: RwLock::new(shipments),
        }
    }

    pub async fn insert(&self, shipment: Shipment) {
        self.shipments.write().await.push(shipment);
    }
}

#[async_trait]
impl ShipmentRepository for InMemoryShipmentRepository {
    async fn list(&self) -> GatewayResult<Vec<Shipment>> {
        Ok(self.shipments.read().await.clone())
    }
}

#[derive(Clone)]
pub struct CoreState {
    pub resolver: CacheAsideResolver,
    pub repository: Arc<dyn ShipmentRepository>,
    pub list_ttl_secs: u64,
}

impl CoreState {
    pub fn new(resolver: CacheAsideResolver, repository: Arc<dyn ShipmentRepository>) -> Self {
        Self {
            resolver,
            repository,
            list_ttl_secs: SHIPMENTS_LIST_TTL_SECS,
        }
    }

    pub fn with_list_ttl(mut self, ttl_secs: u64) -> Self {
        self.list_ttl_secs = ttl_secs;
        self
    }
}

pub fn service_info(environment: String) -> ServiceInfo {
    ServiceInfo {
        name: SERVICE_NAME,
        title: "HarborX Core Service",
        features: &["operations", "analytics"],
        environment,
    }
}

pub fn router(state: CoreState, environment: String) -> Router {
    let shipments = Router::new()
        .route("/api/v1/shipments", get(list_shipments))
        .with_state(state);

    info_router(service_info(environment)).merge(shipments)
}

async fn list_shipments(State(state): State<CoreState>) -> Result<Json<ShipmentListResponse>, GatewayError> {
    let repository = Arc::clone(&state.repository);
    let response = state
        .resolver
        .try_resolve(SHIPMENTS_LIST_KEY, state.list_ttl_secs, || async move {
            debug!("Loading shipments from repository");
            let shipments = repository.list().await?;
            Ok::<_, GatewayError>(ShipmentListResponse::from(shipments))
        })
        .await?;

    Ok(Json(response))
}
