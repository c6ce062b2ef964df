//! # Gateway Module
//!
//! The client-facing reverse proxy: route lookup, request forwarding, error
//! translation and the health endpoint.

pub mod error_translator;
pub mod forwarder;
pub mod routing;
pub mod server;

pub use error_translator::translate;
pub use forwarder::RequestForwarder;
pub use routing::{Route, RouteTable};
pub use server::{build_router, GatewayState};
