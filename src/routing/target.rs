//! Upstream target resolution.
//!
//! # Responsibilities
//! - Recover the wildcard subpath below the forwarder's route prefix
//! - Rewrite it onto the fixed upstream origin and API prefix
//! - Carry the inbound query string over verbatim
//!
//! The raw, still percent-encoded path is used throughout so the rewritten
//! URI is always as valid as the inbound one.

use axum::http::Uri;

use crate::config::UpstreamConfig;
use crate::error::ForwardError;

/// Extract the upstream subpath from an inbound request path.
///
/// Segments below `route_prefix` are split on `/`, empty segments are
/// dropped, and the rest are joined back with `/`. No segments yields the
/// empty string.
pub fn subpath(route_prefix: &str, path: &str) -> String {
    let remainder = path.strip_prefix(route_prefix).unwrap_or(path);
    remainder
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// The single upstream every call is relayed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    origin: String,
    api_prefix: String,
}

impl UpstreamTarget {
    pub fn new(origin: impl Into<String>, api_prefix: impl Into<String>) -> Self {
        Self {
            origin: origin.into().trim_end_matches('/').to_string(),
            api_prefix: api_prefix.into(),
        }
    }

    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self::new(config.origin.clone(), config.api_prefix.clone())
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Build `{origin}{api_prefix}/{subpath}` plus `?{query}` when the
    /// inbound URI carried a query string (even an empty one).
    pub fn resolve(&self, subpath: &str, query: Option<&str>) -> Result<Uri, ForwardError> {
        let mut target = format!("{}{}/{}", self.origin, self.api_prefix, subpath);
        if let Some(query) = query {
            target.push('?');
            target.push_str(query);
        }

        target
            .parse::<Uri>()
            .map_err(|source| ForwardError::InvalidTarget { target, source })
    }

    /// Resolve the upstream URI for an inbound request URI.
    pub fn resolve_inbound(&self, route_prefix: &str, inbound: &Uri) -> Result<Uri, ForwardError> {
        self.resolve(&subpath(route_prefix, inbound.path()), inbound.query())
    }
}
