//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Count served requests and client fetches
//! - Expose a Prometheus-compatible scrape endpoint
//!
//! # Metrics
//! - `weave_requests_total` (counter): requests by method, status
//! - `weave_request_duration_seconds` (histogram): dispatch latency
//! - `weave_fetch_total` (counter): client fetches by transport, outcome
//! - `weave_fetch_duration_seconds` (histogram): client fetch latency
//!
//! # Design Decisions
//! - Uses the `metrics` facade; without an installed recorder every call is a no-op
//! - Labels stay low-cardinality (no paths, no URLs)

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its HTTP listener on `addr`.
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one dispatched request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "weave_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("weave_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record one client fetch. `outcome` is `ok`, `aborted` or `error`.
pub fn record_fetch(transport: &'static str, outcome: &'static str, start: Instant) {
    metrics::counter!(
        "weave_fetch_total",
        "transport" => transport,
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("weave_fetch_duration_seconds", "transport" => transport)
        .record(start.elapsed().as_secs_f64());
}
