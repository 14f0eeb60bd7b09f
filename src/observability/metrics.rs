//! Metrics collection and exposition.
//!
//! # Metrics
//! - `webdriver_proxy_requests_total` (counter): forwarded requests by method, status
//! - `webdriver_proxy_upstream_duration_seconds` (histogram): upstream round-trip latency
//! - `webdriver_proxy_sessions_created_total` (counter)
//! - `webdriver_proxy_session_create_failures_total` (counter): by reason
//! - `webdriver_proxy_classified_errors_total` (counter): by protocol error kind
//! - `webdriver_proxy_tracked_sessions` (gauge): registry size

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_counter!("webdriver_proxy_requests_total", "Requests forwarded upstream");
    describe_histogram!(
        "webdriver_proxy_upstream_duration_seconds",
        "Upstream round-trip latency in seconds"
    );
    describe_counter!("webdriver_proxy_sessions_created_total", "Sessions tracked");
    describe_counter!(
        "webdriver_proxy_session_create_failures_total",
        "Session creations answered with a synthesized error"
    );
    describe_counter!(
        "webdriver_proxy_classified_errors_total",
        "Upstream error responses by protocol error kind"
    );
    describe_gauge!("webdriver_proxy_tracked_sessions", "Entries in the session registry");

    tracing::info!(address = %addr, "Metrics endpoint started");
    Ok(())
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    counter!("webdriver_proxy_requests_total", &labels).increment(1);
    histogram!("webdriver_proxy_upstream_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_session_created() {
    counter!("webdriver_proxy_sessions_created_total").increment(1);
}

pub fn record_session_create_failure(reason: &'static str) {
    counter!("webdriver_proxy_session_create_failures_total", "reason" => reason).increment(1);
}

pub fn record_classified_error(kind: &str) {
    counter!("webdriver_proxy_classified_errors_total", "kind" => kind.to_string()).increment(1);
}

pub fn record_tracked_sessions(count: usize) {
    gauge!("webdriver_proxy_tracked_sessions").set(count as f64);
}
