//! Header sanitization for the relay.
//!
//! Inbound `host` and `content-length` are dropped before forwarding because
//! the client stack recomputes them for the rewritten request. Upstream
//! `transfer-encoding` is dropped on the way back because the body is
//! buffered, not streamed. Everything else passes through untouched,
//! including repeated headers.

use axum::http::HeaderMap;

const REQUEST_STRIPPED: &[&str] = &["host", "content-length"];
const RESPONSE_STRIPPED: &[&str] = &["transfer-encoding"];

fn copy_without(headers: &HeaderMap, stripped: &[&str]) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        if stripped.contains(&name.as_str()) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

/// Copy inbound headers for the upstream request.
pub fn sanitize_request_headers(headers: &HeaderMap) -> HeaderMap {
    copy_without(headers, REQUEST_STRIPPED)
}

/// Copy upstream response headers for the caller.
pub fn sanitize_response_headers(headers: &HeaderMap) -> HeaderMap {
    copy_without(headers, RESPONSE_STRIPPED)
}
