//! Metrics collection and exposition.
//!
//! # Metrics
//! - `foldserve_requests_total` (counter): requests by method and status
//! - `foldserve_request_duration_seconds` (histogram): time to map and read
//! - `foldserve_route_reloads_total` (counter): reloads by result
//! - `foldserve_routes_loaded` (gauge): routes in the published RouteSet
//!
//! # Design Decisions
//! - Recording is always on; without an installed recorder it is a no-op
//! - The Prometheus endpoint is opt-in (`observability.metrics_enabled`)
//! - Methods outside the known verbs share one label value

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::config::watcher::ReloadOutcome;
use crate::routing::Verb;

/// Label used for request methods that are not a known verb.
pub const OTHER_METHOD: &str = "OTHER";

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

/// Bounded label value for a raw request method.
pub fn method_label(method: &str) -> &'static str {
    method
        .parse::<Verb>()
        .map(|verb| verb.as_str())
        .unwrap_or(OTHER_METHOD)
}

/// Record one served request.
pub fn record_request(method: &'static str, status: u16, start: Instant) {
    let status = status.to_string();
    counter!(
        "foldserve_requests_total",
        "method" => method,
        "status" => status.clone()
    )
    .increment(1);
    histogram!(
        "foldserve_request_duration_seconds",
        "method" => method,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record the result of a routes reload.
pub fn record_reload(outcome: ReloadOutcome) {
    let result = match outcome {
        ReloadOutcome::Applied(_) => "applied",
        ReloadOutcome::Cleared => "cleared",
        ReloadOutcome::KeptPrevious => "kept_previous",
    };
    counter!("foldserve_route_reloads_total", "result" => result).increment(1);
}

/// Track the size of the published RouteSet.
pub fn set_routes_loaded(count: usize) {
    gauge!("foldserve_routes_loaded").set(count as f64);
}
