//! Metrics collection and exposition.
//!
//! # Metrics
//! - `leoconnect_requests_total` (counter): requests by method, status
//! - `leoconnect_request_duration_seconds` (histogram): latency by method
//!
//! # Design Decisions
//! - Labels never include the raw path, so cardinality stays bounded
//! - Recording before `init_metrics` is a no-op

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    ::metrics::counter!(
        "leoconnect_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!(
        "leoconnect_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}
