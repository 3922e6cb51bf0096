//! Metrics collection and exposition.
//!
//! # Metrics
//! - `search_requests_total` (counter): responses by status
//! - `search_request_duration_seconds` (histogram): end-to-end latency
//! - `search_rate_limited_total` (counter): refusals by namespace
//! - `search_rate_limit_errors_total` (counter): counter store failures
//! - `search_cache_lookups_total` (counter): hit, miss, error
//! - `search_query_duration_seconds` (histogram): catalog query latency
//! - `search_query_errors_total` (counter): query failures by kind
//!
//! # Design Decisions
//! - Recording is a no-op until [`init_metrics`] installs the exporter
//! - Labels are low-cardinality; client identities never become labels

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(status: u16, start: Instant) {
    counter!("search_requests_total", "status" => status.to_string()).increment(1);
    histogram!("search_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited(namespace: &str) {
    counter!("search_rate_limited_total", "namespace" => namespace.to_string()).increment(1);
}

pub fn record_rate_limit_error() {
    counter!("search_rate_limit_errors_total").increment(1);
}

pub fn record_cache_lookup(result: &'static str) {
    counter!("search_cache_lookups_total", "result" => result).increment(1);
}

pub fn record_query(start: Instant) {
    histogram!("search_query_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_query_error(kind: &'static str) {
    counter!("search_query_errors_total", "kind" => kind).increment(1);
}
