//! Shared utilities for integration tests.
//!
//! Every server binds `127.0.0.1:0` so tests can run in parallel.

#![allow(dead_code)]

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use booking_gateway::config::GatewayConfig;
use booking_gateway::HttpServer;

/// What the upstream saw.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: Method,
    /// Path and query exactly as received.
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<Captured>>>);

impl Recorder {
    pub fn all(&self) -> Vec<Captured> {
        self.0.lock().unwrap().clone()
    }

    pub fn last(&self) -> Captured {
        self.all().pop().expect("upstream saw no request")
    }
}

/// Start an upstream that records every request and answers:
/// - `/api/status/{code}`: that status with body `{"message":"status {code}"}`
/// - `/api/slow/{ms}`: the echo below after sleeping `ms` milliseconds
/// - anything else: 200 with a JSON echo of the request, plus a repeated
///   `set-cookie` and an `x-upstream` header
pub async fn start_capture_upstream() -> (SocketAddr, Recorder) {
    let recorder = Recorder::default();
    let state = recorder.clone();

    let app = Router::new().fallback(move |request: Request<Body>| {
        let state = state.clone();
        async move { capture(state, request).await }
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, recorder)
}

async fn capture(recorder: Recorder, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    let uri = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_default();

    recorder.0.lock().unwrap().push(Captured {
        method: parts.method.clone(),
        uri: uri.clone(),
        headers: parts.headers.clone(),
        body: body.clone(),
    });

    let path = parts.uri.path();
    if let Some(code) = path.strip_prefix("/api/status/") {
        let status = StatusCode::from_u16(code.parse().unwrap()).unwrap();
        return (status, axum::Json(json!({ "message": format!("status {}", code) })))
            .into_response();
    }
    if let Some(ms) = path.strip_prefix("/api/slow/") {
        tokio::time::sleep(Duration::from_millis(ms.parse().unwrap())).await;
    }

    let header = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let echo = json!({
        "method": parts.method.as_str(),
        "uri": uri,
        "authorization": header("authorization"),
        "contentType": header("content-type"),
        "body": String::from_utf8_lossy(&body),
    });

    Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "application/json")
        .header("x-upstream", "capture")
        .header("set-cookie", "a=1")
        .header("set-cookie", "b=2")
        .body(Body::from(echo.to_string()))
        .unwrap()
}

/// Start an upstream that answers every connection with the given raw
/// HTTP/1.1 response bytes.
pub async fn start_raw_upstream(response: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        // Read the request head before answering.
                        let mut buf = vec![0u8; 8192];
                        let mut seen = Vec::new();
                        while let Ok(n) = socket.read(&mut buf).await {
                            if n == 0 {
                                break;
                            }
                            seen.extend_from_slice(&buf[..n]);
                            if seen.windows(4).any(|w| w == b"\r\n\r\n") {
                                break;
                            }
                        }
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });
    addr
}

/// An address nothing is listening on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Gateway config pointed at `upstream`.
pub fn gateway_config(upstream: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.upstream.origin = format!("http://{}", upstream);
    config
}

/// Serve a gateway on an ephemeral port and return its base URL.
pub async fn start_gateway(config: GatewayConfig) -> String {
    let server = HttpServer::new(config);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = server.router();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}
