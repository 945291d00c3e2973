//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gate_requests_total` (counter): requests by endpoint, status
//! - `gate_request_duration_seconds` (histogram): latency by endpoint
//! - `gate_rate_limited_total` (counter): admissions rejected
//! - `gate_cache_lookups_total` (counter): cache hits and misses
//! - `gate_breaker_state` (gauge): 0=closed, 1=open, 2=half-open
//! - `gate_breaker_rejections_total` (counter): calls failed fast
//! - `gate_metrics_ingested_total` (counter): metrics appended
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

const REQUESTS_TOTAL: &str = "gate_requests_total";
const REQUEST_DURATION: &str = "gate_request_duration_seconds";
const RATE_LIMITED_TOTAL: &str = "gate_rate_limited_total";
const CACHE_LOOKUPS_TOTAL: &str = "gate_cache_lookups_total";
const BREAKER_STATE: &str = "gate_breaker_state";
const BREAKER_REJECTIONS_TOTAL: &str = "gate_breaker_rejections_total";
const METRICS_INGESTED_TOTAL: &str = "gate_metrics_ingested_total";

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(endpoint: &'static str, status: u16, start: Instant) {
    counter!(REQUESTS_TOTAL, "endpoint" => endpoint, "status" => status.to_string()).increment(1);
    histogram!(REQUEST_DURATION, "endpoint" => endpoint).record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited() {
    counter!(RATE_LIMITED_TOTAL).increment(1);
}

pub fn record_cache_lookup(result: &'static str) {
    counter!(CACHE_LOOKUPS_TOTAL, "result" => result).increment(1);
}

pub fn record_breaker_state(breaker: &str, value: f64) {
    gauge!(BREAKER_STATE, "breaker" => breaker.to_string()).set(value);
}

pub fn record_breaker_rejection(breaker: &str) {
    counter!(BREAKER_REJECTIONS_TOTAL, "breaker" => breaker.to_string()).increment(1);
}

pub fn record_ingested() {
    counter!(METRICS_INGESTED_TOTAL).increment(1);
}
