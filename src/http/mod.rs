//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request under the route prefix
//!     → server.rs (Axum setup, request span)
//!     → routing/target.rs (rewrite onto upstream)
//!     → body.rs (JSON re-encoding or raw pass-through)
//!     → request.rs (sanitized headers, upstream request)
//!     → upstream
//!     → response.rs (buffer, strip transfer-encoding)
//!     → Send to client
//! ```

pub mod body;
pub mod request;
pub mod response;
pub mod server;

pub use body::OutboundBody;
pub use server::{AppState, ForwardSettings, HttpServer};
