//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server swaps forwarding settings atomically
//! ```
//!
//! Listener address and route prefix are fixed at startup; upstream and
//! body-handling settings can be swapped at runtime.

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ForwarderConfig, GatewayConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    UpstreamConfig,
};
pub use watcher::ConfigWatcher;
