//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): relayed requests by method, status
//! - `gateway_request_duration_seconds` (histogram): end-to-end relay latency
//! - `gateway_relay_failures_total` (counter): collapsed 500s by failure kind
//!
//! Recording is a no-op until `init_metrics` installs the Prometheus
//! recorder.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed relay.
pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("gateway_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record a relay that collapsed into the opaque 500.
pub fn record_relay_failure(kind: &'static str) {
    metrics::counter!("gateway_relay_failures_total", "kind" => kind).increment(1);
}
