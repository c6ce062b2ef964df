//! Protocol-level helpers shared by every HarborX service.

pub mod http;

pub use http::{cors_layer, CorsConfig};
