//! Booking gateway library.
//!
//! A same-origin reverse forwarder that relays calls under a fixed route
//! prefix to a single upstream booking API.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::schema::GatewayConfig;
pub use error::ForwardError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
