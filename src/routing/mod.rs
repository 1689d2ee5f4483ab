//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request (path under route prefix, query)
//!     → target.rs (subpath extraction)
//!     → target.rs (rewrite onto upstream origin + API prefix)
//!     → Upstream URI
//! ```
//!
//! There is exactly one upstream. Routing is a pure rewrite with no
//! matching or load balancing.

pub mod target;

pub use target::{subpath, UpstreamTarget};
