//! HTTP server setup and the forwarding handler.
//!
//! # Responsibilities
//! - Create the Axum Router with the wildcard forwarding route
//! - Wire up middleware (tracing span with request ID)
//! - Hold hot-swappable forwarding settings
//! - Relay each request to the upstream exactly once
//! - Collapse any relay-time failure into the opaque 500

use arc_swap::ArcSwap;
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::error::{BodyError, ForwardError};
use crate::http::body::{encode_request_body, is_bodyless};
use crate::http::request::{build_upstream_request, make_request_span};
use crate::http::response::relay_response;
use crate::observability::metrics;
use crate::routing::UpstreamTarget;

/// Upstream client shared by every relay.
pub type UpstreamClient = Client<HttpConnector, Body>;

/// Settings consulted on every relay. Swapped as a whole on reload.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardSettings {
    pub target: UpstreamTarget,
    pub route_prefix: String,
    pub max_body_bytes: usize,
    pub raw_passthrough: Vec<String>,
}

impl ForwardSettings {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            target: UpstreamTarget::from_config(&config.upstream),
            route_prefix: config.forwarder.route_prefix.clone(),
            max_body_bytes: config.forwarder.max_body_bytes,
            raw_passthrough: config.forwarder.raw_passthrough.clone(),
        }
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<ArcSwap<ForwardSettings>>,
    pub client: UpstreamClient,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    state: AppState,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(config.upstream.connect_timeout_secs.map(Duration::from_secs));

        let client = Client::builder(TokioExecutor::new()).build(connector);

        let state = AppState {
            settings: Arc::new(ArcSwap::from_pointee(ForwardSettings::from_config(&config))),
            client,
        };

        let router = Self::build_router(&config.forwarder.route_prefix, state.clone());
        Self {
            router,
            state,
            config,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(route_prefix: &str, state: AppState) -> Router {
        Router::new()
            .route(route_prefix, any(forward_handler))
            .route(&format!("{route_prefix}/"), any(forward_handler))
            .route(&format!("{route_prefix}/{{*path}}"), any(forward_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<Body>))
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Settings currently in effect.
    pub fn settings(&self) -> Arc<ForwardSettings> {
        self.state.settings.load_full()
    }

    /// Swap in the forwarding settings of a reloaded config.
    ///
    /// The route prefix is baked into the router, so a changed prefix is
    /// logged and ignored until restart.
    pub fn apply_config(&self, config: &GatewayConfig) {
        apply_config(&self.state, config);
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            route_prefix = %self.config.forwarder.route_prefix,
            upstream = %self.config.upstream.origin,
            "HTTP server starting"
        );

        let reload_state = self.state.clone();
        tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                apply_config(&reload_state, &new_config);
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn apply_config(state: &AppState, config: &GatewayConfig) {
    let current = state.settings.load_full();
    let mut next = ForwardSettings::from_config(config);

    if next.route_prefix != current.route_prefix {
        tracing::warn!(
            current = %current.route_prefix,
            requested = %next.route_prefix,
            "Route prefix changes require a restart; keeping current prefix"
        );
        next.route_prefix = current.route_prefix.clone();
    }

    if next == *current {
        tracing::debug!("Reloaded config has no forwarding changes");
        return;
    }

    tracing::info!(upstream = %next.target.origin(), "Forwarding settings reloaded");
    state.settings.store(Arc::new(next));
}

/// Forwarding handler for every method under the route prefix.
async fn forward_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let settings = state.settings.load_full();

    match forward(&state.client, &settings, request).await {
        Ok(response) => {
            tracing::debug!(status = %response.status(), "Upstream responded");
            metrics::record_request(method.as_str(), response.status().as_u16(), start_time);
            response
        }
        Err(e) => {
            tracing::error!(error = %e, kind = e.kind(), "Proxy error");
            metrics::record_relay_failure(e.kind());
            metrics::record_request(method.as_str(), 500, start_time);
            e.into_response()
        }
    }
}

/// Relay one request to the upstream and buffer its response.
pub async fn forward(
    client: &UpstreamClient,
    settings: &ForwardSettings,
    request: Request<Body>,
) -> Result<Response, ForwardError> {
    let (parts, body) = request.into_parts();

    let uri = settings
        .target
        .resolve_inbound(&settings.route_prefix, &parts.uri)?;

    let bytes = if is_bodyless(&parts.method) {
        Bytes::new()
    } else {
        axum::body::to_bytes(body, settings.max_body_bytes)
            .await
            .map_err(BodyError::Read)?
    };

    let outbound = encode_request_body(
        &parts.method,
        &parts.headers,
        bytes,
        &settings.raw_passthrough,
    )?;

    tracing::debug!(upstream = %uri, "Forwarding request");

    let upstream_request = build_upstream_request(parts.method, uri, &parts.headers, outbound)?;
    let upstream_response = client.request(upstream_request).await?;

    relay_response(upstream_response).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reload_keeps_route_prefix() {
        let server = HttpServer::new(GatewayConfig::default());

        let mut reloaded = GatewayConfig::default();
        reloaded.upstream.origin = "http://127.0.0.1:5999".into();
        reloaded.forwarder.route_prefix = "/elsewhere".into();
        server.apply_config(&reloaded);

        let settings = server.settings();
        assert_eq!(settings.target.origin(), "http://127.0.0.1:5999");
        assert_eq!(settings.route_prefix, "/api/proxy");
    }
}
