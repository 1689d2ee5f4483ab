//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the booking gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream API the forwarder relays to.
    pub upstream: UpstreamConfig,

    /// Forwarding behaviour (route prefix, body handling).
    pub forwarder: ForwarderConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// The single upstream origin every forwarded call lands on.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Scheme and authority only, e.g. "http://hotel-booking.runasp.net".
    pub origin: String,

    /// Path prefix prepended to every forwarded subpath.
    pub api_prefix: String,

    /// Optional TCP connect timeout in seconds. Unset leaves the
    /// connector default in place.
    pub connect_timeout_secs: Option<u64>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            origin: "http://hotel-booking.runasp.net".to_string(),
            api_prefix: "/api".to_string(),
            connect_timeout_secs: None,
        }
    }
}

/// Forwarder route and body handling.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ForwarderConfig {
    /// Same-origin path prefix the wildcard route is mounted under.
    pub route_prefix: String,

    /// Largest inbound body the forwarder will buffer, in bytes.
    pub max_body_bytes: usize,

    /// Media types relayed byte-for-byte instead of being re-encoded as JSON.
    pub raw_passthrough: Vec<String>,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            route_prefix: "/api/proxy".to_string(),
            max_body_bytes: 2 * 1024 * 1024, // 2MB
            raw_passthrough: vec!["multipart/form-data".to_string()],
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [upstream]
            origin = "http://127.0.0.1:5000"
            "#,
        )
        .unwrap();

        assert_eq!(config.upstream.origin, "http://127.0.0.1:5000");
        assert_eq!(config.upstream.api_prefix, "/api");
        assert_eq!(config.forwarder.route_prefix, "/api/proxy");
        assert_eq!(config.forwarder.raw_passthrough, vec!["multipart/form-data"]);
        assert_eq!(config.listener, ListenerConfig::default());
    }

    #[test]
    fn test_log_format_is_lowercase() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }
}
