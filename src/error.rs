//! Relay failures.
//!
//! Every variant collapses to the same opaque 500 response. The cause is
//! logged and never returned to the caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Body of every failed relay.
pub const PROXY_ERROR_MESSAGE: &str = "Proxy Error";

/// Why an inbound body could not be prepared for the upstream.
#[derive(Debug, thiserror::Error)]
pub enum BodyError {
    #[error("failed to read request body: {0}")]
    Read(axum::Error),

    #[error("request body is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("request body is not valid UTF-8")]
    InvalidUtf8,
}

/// Errors raised while relaying one request.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("invalid upstream target '{target}': {source}")]
    InvalidTarget {
        target: String,
        source: axum::http::uri::InvalidUri,
    },

    #[error(transparent)]
    Body(#[from] BodyError),

    #[error("failed to build upstream request: {0}")]
    Build(#[from] axum::http::Error),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    #[error("failed to read upstream response: {0}")]
    ReadResponse(axum::Error),
}

impl ForwardError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::InvalidTarget { .. } => "invalid_target",
            ForwardError::Body(_) => "request_body",
            ForwardError::Build(_) => "build",
            ForwardError::Upstream(_) => "upstream",
            ForwardError::ReadResponse(_) => "response_body",
        }
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": PROXY_ERROR_MESSAGE })),
        )
            .into_response()
    }
}
