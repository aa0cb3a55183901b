//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): calls by method, status, outcome
//! - `relay_request_duration_seconds` (histogram): end-to-end latency

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one finished relay call.
pub fn record_relay(method: &str, status: u16, outcome: &'static str, started: Instant) {
    let method = method.to_ascii_uppercase();
    let status = status.to_string();

    metrics::counter!(
        "relay_requests_total",
        "method" => method.clone(),
        "status" => status.clone(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!(
        "relay_request_duration_seconds",
        "method" => method,
        "status" => status,
        "outcome" => outcome
    )
    .record(started.elapsed().as_secs_f64());
}
