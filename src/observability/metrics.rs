//! Metrics collection and exposition.
//!
//! # Metrics
//! - `balancer_requests_total` (counter): requests by status and backend
//! - `balancer_request_duration_seconds` (histogram): latency by backend
//! - `balancer_backend_health` (gauge): 1=healthy, 0=unhealthy
//! - `balancer_health_probes_total` (counter): probe outcomes by backend
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus recorder.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and serve it on `addr`.
///
/// Must run inside the Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        tracing::error!(error = %e, "Failed to install metrics exporter");
        return;
    }

    describe_counter!("balancer_requests_total", Unit::Count, "Requests handled by the balancer");
    describe_histogram!(
        "balancer_request_duration_seconds",
        Unit::Seconds,
        "Time from request receipt to upstream response head"
    );
    describe_gauge!("balancer_backend_health", "Latest probe result per backend (1=healthy)");
    describe_counter!("balancer_health_probes_total", Unit::Count, "Health probes by outcome");

    tracing::info!(address = %addr, "Metrics exporter listening");
}

/// Record one handled request.
pub fn record_request(status: u16, backend: &str, start: Instant) {
    counter!(
        "balancer_requests_total",
        "status" => status.to_string(),
        "backend" => backend.to_string()
    )
    .increment(1);
    histogram!("balancer_request_duration_seconds", "backend" => backend.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record the outcome of one health probe.
pub fn record_backend_health(backend: &str, healthy: bool) {
    gauge!("balancer_backend_health", "backend" => backend.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
    counter!(
        "balancer_health_probes_total",
        "backend" => backend.to_string(),
        "result" => if healthy { "healthy" } else { "unhealthy" }
    )
    .increment(1);
}
