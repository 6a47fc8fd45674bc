//! Metrics collection and exposition.
//!
//! # Metrics
//! - `vhost_requests_total` (counter): requests by status
//! - `vhost_reload_total` (counter): reloads by result
//! - `vhost_reload_duration_seconds` (histogram): time to build a generation
//! - `vhost_files` (gauge): distinct contents in the current generation
//! - `vhost_plain_bytes`, `vhost_gzip_bytes` (gauges): memory held by it
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels are low-cardinality (status code, result)

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::content::ContentStats;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one served request.
pub fn record_request(status: u16) {
    counter!("vhost_requests_total", "status" => status.to_string()).increment(1);
}

/// Record a finished reload attempt.
pub fn record_reload(ok: bool, start: Instant) {
    let result = if ok { "ok" } else { "error" };
    counter!("vhost_reload_total", "result" => result).increment(1);
    histogram!("vhost_reload_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Publish the size of the current generation.
pub fn record_content(stats: &ContentStats) {
    gauge!("vhost_files").set(stats.files as f64);
    gauge!("vhost_plain_bytes").set(stats.plain_bytes as f64);
    gauge!("vhost_gzip_bytes").set(stats.gzip_bytes as f64);
}
