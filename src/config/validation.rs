//! Configuration validation.
//!
//! Serde handles syntax; this module checks semantics. All problems are
//! reported together rather than stopping at the first.

use std::net::SocketAddr;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    match Url::parse(&config.upstream.origin) {
        Ok(url) => {
            // The relay client speaks plain HTTP only.
            if url.scheme() != "http" {
                errors.push(ValidationError::new(
                    "upstream.origin",
                    format!("unsupported scheme '{}', expected http", url.scheme()),
                ));
            }
            if url.host_str().is_none() {
                errors.push(ValidationError::new("upstream.origin", "missing host"));
            }
            if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
                errors.push(ValidationError::new(
                    "upstream.origin",
                    "must be scheme and authority only; put paths in upstream.api_prefix",
                ));
            }
        }
        Err(e) => errors.push(ValidationError::new("upstream.origin", e.to_string())),
    }

    check_prefix(&mut errors, "upstream.api_prefix", &config.upstream.api_prefix, true);
    check_prefix(&mut errors, "forwarder.route_prefix", &config.forwarder.route_prefix, false);

    if config.upstream.connect_timeout_secs == Some(0) {
        errors.push(ValidationError::new(
            "upstream.connect_timeout_secs",
            "must be greater than zero when set",
        ));
    }

    if config.forwarder.max_body_bytes == 0 {
        errors.push(ValidationError::new(
            "forwarder.max_body_bytes",
            "must be greater than zero",
        ));
    }

    for media_type in &config.forwarder.raw_passthrough {
        let valid = media_type
            .split_once('/')
            .map(|(t, s)| !t.is_empty() && !s.is_empty() && !media_type.contains(';'))
            .unwrap_or(false);
        if !valid {
            errors.push(ValidationError::new(
                "forwarder.raw_passthrough",
                format!("'{}' is not a bare media type", media_type),
            ));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "'{}' is not a socket address",
                config.observability.metrics_address
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_prefix(
    errors: &mut Vec<ValidationError>,
    field: &'static str,
    prefix: &str,
    allow_empty: bool,
) {
    if prefix.is_empty() {
        if !allow_empty {
            errors.push(ValidationError::new(field, "must not be empty"));
        }
        return;
    }
    if !prefix.starts_with('/') {
        errors.push(ValidationError::new(field, "must start with '/'"));
    }
    if prefix.ends_with('/') {
        errors.push(ValidationError::new(field, "must not end with '/'"));
    }
    if prefix.contains(['?', '#', '*', '{', '}']) {
        errors.push(ValidationError::new(field, "must be a literal path"));
    }
}
