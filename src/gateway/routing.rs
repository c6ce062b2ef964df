//! Prefix route table mapping inbound paths to backends.
//!
//! The outbound path is the inbound path unchanged; only the base URL differs.

use crate::core::types::BackendTarget;

pub const AUTH_PREFIX: &str = "/api/v1/auth/";
pub const SHIPMENTS_PREFIX: &str = "/api/v1/shipments";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub prefix: String,
    pub target: BackendTarget,
}

/// Ordered list of prefix routes; first match wins
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard HarborX table: auth calls to the auth backend, shipment
    /// calls to the core backend
    pub fn harborx(auth: BackendTarget, core: BackendTarget) -> Self {
        Self::new().route(AUTH_PREFIX, auth).route(SHIPMENTS_PREFIX, core)
    }

    pub fn route<P: Into<String>>(mut self, prefix: P, target: BackendTarget) -> Self {
        self.routes.push(Route {
            prefix: prefix.into(),
            target,
        });
        self
    }

    /// Backend responsible for `path`, if any
    pub fn resolve(&self, path: &str) -> Option<&BackendTarget> {
        self.routes
            .iter()
            .find(|route| path.starts_with(&route.prefix))
            .map(|route| &route.target)
    }

    /// Every distinct backend, in registration order
    pub fn targets(&self) -> Vec<BackendTarget> {
        let mut targets: Vec<BackendTarget> = Vec::new();
        for route in &self.routes {
            if !targets.contains(&route.target) {
                targets.push(route.target.clone());
            }
        }
        targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable {
        RouteTable::harborx(
            BackendTarget::new("auth", "http://auth:8001"),
            BackendTarget::new("core", "http://core:8002"),
        )
    }

    #[test]
    fn test_resolution() {
        let table = table();
        assert_eq!(table.resolve("/api/v1/auth/login").unwrap().name, "auth");
        assert_eq!(table.resolve("/api/v1/shipments").unwrap().name, "core");
        assert_eq!(table.resolve("/api/v1/shipments/42/events").unwrap().name, "core");
        assert!(table.resolve("/api/v1/auth").is_none());
        assert!(table.resolve("/api/v2/shipments").is_none());
        assert!(table.resolve("/").is_none());
    }

    #[test]
    fn test_targets_are_deduplicated() {
        let core = BackendTarget::new("core", "http://core:8002");
        let table = RouteTable::new()
            .route("/a", core.clone())
            .route("/b", core);
        assert_eq!(table.targets().len(), 1);
        assert_eq!(self::table().targets().len(), 2);
    }
}
