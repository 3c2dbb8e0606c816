//! Metrics collection and exposition.
//!
//! # Metrics
//! - `similar_requests_total` (counter): inbound requests by status
//! - `similar_request_duration_seconds` (histogram): inbound latency
//! - `similar_cache_events_total` (counter): cache events by cache and kind
//! - `similar_cache_entries` (gauge): live entries per cache
//! - `similar_upstream_calls_total` (counter): upstream calls by class, outcome
//! - `similar_breaker_transitions_total` (counter): breaker transitions by class, target state

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter with its own HTTP listener.
///
/// Must run inside the Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed inbound request.
pub fn record_request(status: u16, start: Instant) {
    counter!("similar_requests_total", "status" => status.to_string()).increment(1);
    histogram!("similar_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record a cache event (`hit`, `miss`, `created`, `expired`, `removed`, `evicted`, `cleared`).
pub fn record_cache_event(cache: &'static str, event: &'static str) {
    counter!("similar_cache_events_total", "cache" => cache, "event" => event).increment(1);
}

/// Record the number of live entries of a cache.
pub fn record_cache_size(cache: &'static str, size: usize) {
    gauge!("similar_cache_entries", "cache" => cache).set(size as f64);
}

/// Record the outcome of a guarded upstream call.
pub fn record_upstream_call(class: &'static str, outcome: &'static str) {
    counter!("similar_upstream_calls_total", "class" => class, "outcome" => outcome).increment(1);
}

/// Record a breaker state transition.
pub fn record_breaker_transition(class: &str, to: &'static str) {
    counter!("similar_breaker_transitions_total", "class" => class.to_string(), "to" => to).increment(1);
}
