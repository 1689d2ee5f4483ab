//! Request handling and transformation.
//!
//! # Responsibilities
//! - Attach a request ID to the tracing span of every inbound call
//! - Build the upstream request from the rewritten URI, sanitized headers
//!   and re-encoded body
//!
//! The request ID lives on the span only. It is never added to the
//! forwarded headers, so the upstream sees exactly what the caller sent.

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Method, Request, Uri},
};
use tracing::Span;
use uuid::Uuid;

use crate::error::ForwardError;
use crate::http::body::OutboundBody;
use crate::security::sanitize_request_headers;

/// Span factory for `TraceLayer`: one span per inbound request, tagged with
/// a fresh UUID v4.
pub fn make_request_span<B>(request: &Request<B>) -> Span {
    let request_id = Uuid::new_v4();
    tracing::info_span!(
        "forward",
        request_id = %request_id,
        method = %request.method(),
        uri = %request.uri(),
    )
}

/// Assemble the upstream request.
pub fn build_upstream_request(
    method: Method,
    uri: Uri,
    inbound_headers: &HeaderMap,
    body: OutboundBody,
) -> Result<Request<Body>, ForwardError> {
    let mut headers = sanitize_request_headers(inbound_headers);

    let body = match body {
        OutboundBody::Absent => Body::empty(),
        OutboundBody::Json(bytes) => {
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
            Body::from(bytes)
        }
        OutboundBody::Raw(bytes) => Body::from(bytes),
    };

    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(target) = builder.headers_mut() {
        *target = headers;
    }
    Ok(builder.body(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;

    #[test]
    fn test_json_body_forces_content_type() {
        let mut inbound = HeaderMap::new();
        inbound.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        inbound.insert(header::HOST, HeaderValue::from_static("localhost"));
        inbound.insert("x-custom", HeaderValue::from_static("kept"));

        let request = build_upstream_request(
            Method::POST,
            "http://upstream/api/Bookings".parse().unwrap(),
            &inbound,
            OutboundBody::Json(Bytes::from_static(b"\"hi\"")),
        )
        .unwrap();

        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(request.headers()["x-custom"], "kept");
        assert!(request.headers().get(header::HOST).is_none());
    }

    #[test]
    fn test_raw_body_keeps_content_type() {
        let mut inbound = HeaderMap::new();
        inbound.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("multipart/form-data; boundary=b"),
        );

        let request = build_upstream_request(
            Method::PUT,
            "http://upstream/api/Rooms/3".parse().unwrap(),
            &inbound,
            OutboundBody::Raw(Bytes::from_static(b"--b--")),
        )
        .unwrap();

        assert_eq!(
            request.headers()[header::CONTENT_TYPE],
            "multipart/form-data; boundary=b"
        );
    }

    #[test]
    fn test_absent_body_leaves_headers_alone() {
        let mut inbound = HeaderMap::new();
        inbound.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let request = build_upstream_request(
            Method::GET,
            "http://upstream/api/Rooms".parse().unwrap(),
            &inbound,
            OutboundBody::Absent,
        )
        .unwrap();

        assert!(request.headers().get(header::CONTENT_TYPE).is_none());
        assert_eq!(request.headers()[header::ACCEPT], "application/json");
    }
}
