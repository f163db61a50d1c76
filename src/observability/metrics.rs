//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define front-end metrics (requests, latency, upstream calls)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `http_requests_total` (counter): inbound requests by method, status
//! - `http_request_duration_seconds` (histogram): inbound latency
//! - `search_upstream_requests_total` (counter): search API calls by outcome
//! - `search_upstream_duration_seconds` (histogram): search API latency
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels are bounded: method, status code, outcome

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter with an HTTP scrape endpoint on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one completed inbound request.
pub fn record_request(method: &str, status: u16, elapsed: Duration) {
    let status = status.to_string();
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "status" => status.clone()
    )
    .increment(1);
    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status
    )
    .record(elapsed.as_secs_f64());
}

/// Record one call to the search API. `outcome` is the status code or `error`.
pub fn record_upstream(outcome: &str, elapsed: Duration) {
    metrics::counter!("search_upstream_requests_total", "outcome" => outcome.to_string())
        .increment(1);
    metrics::histogram!("search_upstream_duration_seconds").record(elapsed.as_secs_f64());
}
