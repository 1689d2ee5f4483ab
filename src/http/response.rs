//! Response relaying.
//!
//! The upstream status and body are copied verbatim. Headers are copied
//! minus `transfer-encoding`, since the body is buffered in full before it
//! is written back.

use axum::{
    body::Body,
    http::Response as HttpResponse,
    response::Response,
};
use hyper::body::Incoming;

use crate::error::ForwardError;
use crate::security::sanitize_response_headers;

/// Buffer an upstream response and turn it into the outbound response.
pub async fn relay_response(upstream: HttpResponse<Incoming>) -> Result<Response, ForwardError> {
    let (parts, body) = upstream.into_parts();

    let bytes = axum::body::to_bytes(Body::new(body), usize::MAX)
        .await
        .map_err(ForwardError::ReadResponse)?;

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = parts.status;
    *response.headers_mut() = sanitize_response_headers(&parts.headers);
    Ok(response)
}
