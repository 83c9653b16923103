//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_requests_total` (counter): completed requests by method, status
//! - `http_request_duration_seconds` (histogram): latency distribution
//! - `http_requests_in_flight` (gauge): requests currently inside the harness
//! - `store_probe_failures_total` (counter): failed liveness probes
//! - `shutdown_triggers_total` (counter): triggers by source and whether they won

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder};

const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )?
        .install()?;

    describe_counter!("http_requests_total", "Completed HTTP requests");
    describe_histogram!(
        "http_request_duration_seconds",
        "Wall-clock time spent inside the request harness"
    );
    describe_gauge!("http_requests_in_flight", "Requests currently executing");
    describe_counter!("store_probe_failures_total", "Failed store liveness probes");
    describe_counter!("shutdown_triggers_total", "Shutdown trigger invocations");

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, elapsed: Duration) {
    counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("http_request_duration_seconds", "method" => method.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_in_flight(count: usize) {
    gauge!("http_requests_in_flight").set(count as f64);
}

pub fn record_probe_failure(resource: &str) {
    counter!("store_probe_failures_total", "resource" => resource.to_string()).increment(1);
}

pub fn record_shutdown_trigger(source: &'static str, fired: bool) {
    let outcome = if fired { "fired" } else { "redundant" };
    counter!("shutdown_triggers_total", "source" => source, "outcome" => outcome).increment(1);
}
