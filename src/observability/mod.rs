// Structured logging
pub mod logging;

// Backend health probing
pub mod health;

pub use health::{BackendHealthProber, BackendStatus, HealthProbe, HealthStatus, HttpHealthProbe, OverallStatus};
pub use logging::{init_logging, LogConfig, LogFormat};
