//! Request body re-encoding.
//!
//! The forwarder speaks JSON to the upstream. A mutating request's body is
//! parsed when its content type is JSON, plain text, a urlencoded form or
//! an octet stream, and re-serialized as compact JSON. Any other body,
//! untyped ones included, is not forwarded. Media types listed in
//! `forwarder.raw_passthrough` skip all this and are relayed byte-for-byte,
//! which is what multipart room uploads need.

use axum::body::Bytes;
use axum::http::{header, HeaderMap, Method};
use serde_json::{Map, Value};

use crate::error::BodyError;

/// What the upstream request will carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundBody {
    /// GET and HEAD never carry a body.
    Absent,
    /// JSON re-encoding of the inbound body. Empty when nothing was sent.
    Json(Bytes),
    /// Inbound bytes unchanged, original content type kept.
    Raw(Bytes),
}

/// Whether `method` is forwarded without a body.
pub fn is_bodyless(method: &Method) -> bool {
    method == Method::GET || method == Method::HEAD
}

/// Bare, lowercased media type of a request (parameters stripped).
pub fn media_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
}

/// Decide what to send upstream for an inbound body.
pub fn encode_request_body(
    method: &Method,
    headers: &HeaderMap,
    body: Bytes,
    raw_passthrough: &[String],
) -> Result<OutboundBody, BodyError> {
    if is_bodyless(method) {
        return Ok(OutboundBody::Absent);
    }

    let media_type = media_type(headers);

    if let Some(ref mt) = media_type {
        if raw_passthrough.iter().any(|p| p.eq_ignore_ascii_case(mt)) {
            return Ok(OutboundBody::Raw(body));
        }
    }

    if body.is_empty() {
        return Ok(OutboundBody::Json(Bytes::new()));
    }

    match parse_body(media_type.as_deref(), &body)? {
        Some(value) => Ok(OutboundBody::Json(Bytes::from(serde_json::to_vec(&value)?))),
        None => {
            tracing::debug!(
                media_type = media_type.as_deref().unwrap_or("none"),
                bytes = body.len(),
                "Unparsed body type, forwarding without a body"
            );
            Ok(OutboundBody::Json(Bytes::new()))
        }
    }
}

/// Parse a body the four recognised media types allow. Anything else,
/// untyped bodies included, parses to nothing.
fn parse_body(media_type: Option<&str>, body: &[u8]) -> Result<Option<Value>, BodyError> {
    let value = match media_type {
        Some("application/json") => serde_json::from_slice(body)?,
        Some("text/plain") => Value::String(utf8(body)?),
        Some("application/x-www-form-urlencoded") => parse_form(body),
        Some("application/octet-stream") => buffer_json(body),
        _ => return Ok(None),
    };
    Ok(Some(value))
}

/// Binary bodies serialize the way a Node `Buffer` does:
/// `{"type":"Buffer","data":[..bytes..]}`.
fn buffer_json(body: &[u8]) -> Value {
    let mut fields = Map::new();
    fields.insert("type".to_string(), Value::String("Buffer".to_string()));
    fields.insert(
        "data".to_string(),
        Value::Array(body.iter().map(|b| Value::from(*b)).collect()),
    );
    Value::Object(fields)
}

fn utf8(body: &[u8]) -> Result<String, BodyError> {
    std::str::from_utf8(body)
        .map(str::to_string)
        .map_err(|_| BodyError::InvalidUtf8)
}

/// Decode a urlencoded form into a JSON object. Repeated keys collect into
/// an array in arrival order.
fn parse_form(body: &[u8]) -> Value {
    let mut fields = Map::new();
    for (key, value) in url::form_urlencoded::parse(body) {
        let value = Value::String(value.into_owned());
        match fields.get_mut(key.as_ref()) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                fields.insert(key.into_owned(), value);
            }
        }
    }
    Value::Object(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        headers
    }

    fn passthrough() -> Vec<String> {
        vec!["multipart/form-data".to_string()]
    }

    fn json_of(body: OutboundBody) -> Value {
        match body {
            OutboundBody::Json(bytes) => serde_json::from_slice(&bytes).unwrap(),
            other => panic!("expected JSON body, got {:?}", other),
        }
    }

    #[test]
    fn test_get_and_head_drop_body() {
        for method in [Method::GET, Method::HEAD] {
            let out = encode_request_body(
                &method,
                &headers("application/json"),
                Bytes::from_static(b"{\"a\":1}"),
                &passthrough(),
            )
            .unwrap();
            assert_eq!(out, OutboundBody::Absent);
        }
    }

    #[test]
    fn test_json_is_compacted() {
        let out = encode_request_body(
            &Method::POST,
            &headers("application/json; charset=utf-8"),
            Bytes::from_static(b"{ \"email\" : \"a@b.c\",\n \"password\": \"x\" }"),
            &passthrough(),
        )
        .unwrap();
        assert_eq!(
            out,
            OutboundBody::Json(Bytes::from_static(br#"{"email":"a@b.c","password":"x"}"#))
        );
    }

    #[test]
    fn test_text_becomes_json_string() {
        let out = encode_request_body(
            &Method::PUT,
            &headers("text/plain"),
            Bytes::from_static(b"hello"),
            &passthrough(),
        )
        .unwrap();
        assert_eq!(json_of(out), Value::String("hello".into()));
    }

    #[test]
    fn test_form_fields_become_object() {
        let out = encode_request_body(
            &Method::POST,
            &headers("application/x-www-form-urlencoded"),
            Bytes::from_static(b"name=Spa&price=40&tag=a&tag=b"),
            &passthrough(),
        )
        .unwrap();
        assert_eq!(
            json_of(out),
            serde_json::json!({ "name": "Spa", "price": "40", "tag": ["a", "b"] })
        );
    }

    #[test]
    fn test_multipart_passes_through() {
        let raw = Bytes::from_static(b"--xyz\r\nContent-Disposition: form-data; name=\"Number\"\r\n\r\n101\r\n--xyz--\r\n");
        let out = encode_request_body(
            &Method::POST,
            &headers("multipart/form-data; boundary=xyz"),
            raw.clone(),
            &passthrough(),
        )
        .unwrap();
        assert_eq!(out, OutboundBody::Raw(raw));
    }

    #[test]
    fn test_multipart_without_passthrough_sends_no_body() {
        let out = encode_request_body(
            &Method::POST,
            &headers("multipart/form-data; boundary=xyz"),
            Bytes::from_static(b"--xyz--"),
            &[],
        )
        .unwrap();
        assert_eq!(out, OutboundBody::Json(Bytes::new()));
    }

    #[test]
    fn test_unrecognised_types_send_no_body() {
        for content_type in ["application/xml", "application/problem+json", "text/html"] {
            let out = encode_request_body(
                &Method::POST,
                &headers(content_type),
                Bytes::from_static(b"<room number=\"4\"/>"),
                &passthrough(),
            )
            .unwrap();
            assert_eq!(out, OutboundBody::Json(Bytes::new()), "{}", content_type);
        }
    }

    #[test]
    fn test_octet_stream_becomes_buffer_object() {
        let out = encode_request_body(
            &Method::PUT,
            &headers("application/octet-stream"),
            Bytes::from_static(&[0, 255, 7]),
            &passthrough(),
        )
        .unwrap();
        assert_eq!(
            json_of(out),
            serde_json::json!({ "type": "Buffer", "data": [0, 255, 7] })
        );
    }

    #[test]
    fn test_invalid_utf8_text_is_an_error() {
        let err = encode_request_body(
            &Method::POST,
            &headers("text/plain"),
            Bytes::from_static(&[0xff, 0xfe]),
            &passthrough(),
        )
        .unwrap_err();
        assert!(matches!(err, BodyError::InvalidUtf8));
    }

    #[test]
    fn test_empty_body_stays_empty() {
        let out = encode_request_body(&Method::PUT, &HeaderMap::new(), Bytes::new(), &passthrough())
            .unwrap();
        assert_eq!(out, OutboundBody::Json(Bytes::new()));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let err = encode_request_body(
            &Method::POST,
            &headers("application/json"),
            Bytes::from_static(b"{not json"),
            &passthrough(),
        )
        .unwrap_err();
        assert!(matches!(err, BodyError::InvalidJson(_)));
    }

    #[test]
    fn test_untyped_body_is_dropped() {
        for raw in [&b"plain words"[..], &b"{\"a\":1}"[..]] {
            let out = encode_request_body(
                &Method::DELETE,
                &HeaderMap::new(),
                Bytes::copy_from_slice(raw),
                &passthrough(),
            )
            .unwrap();
            assert_eq!(out, OutboundBody::Json(Bytes::new()));
        }
    }
}
