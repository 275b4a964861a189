//! Metrics collection and exposition.
//!
//! # Metrics
//! - `route_requests_total` (counter): requests by method, status, locale
//! - `route_request_duration_seconds` (histogram): handler latency
//! - `route_redirects_total` (counter): locale redirects by locale
//! - `route_not_found_total` (counter): requests with no route and no redirect
//! - `route_expansion_duration_seconds` (histogram): full expansion passes
//! - `route_registered_routes` (gauge): routes in the active set
//! - `route_cache_events_total` (counter): cache hit / miss / write / clear
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Labels stay low-cardinality: no paths or route names

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, locale: &str, start: Instant) {
    counter!(
        "route_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "locale" => locale.to_string()
    )
    .increment(1);
    histogram!("route_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_redirect(locale: &str) {
    counter!("route_redirects_total", "locale" => locale.to_string()).increment(1);
}

pub fn record_not_found(method: &str) {
    counter!("route_not_found_total", "method" => method.to_string()).increment(1);
}

pub fn record_expansion(start: Instant, routes: usize) {
    histogram!("route_expansion_duration_seconds").record(start.elapsed().as_secs_f64());
    record_registered_routes(routes);
}

/// Size of the active route set, however it was built.
pub fn record_registered_routes(routes: usize) {
    gauge!("route_registered_routes").set(routes as f64);
}

/// `event` is one of `hit`, `miss`, `write`, `clear`, `error`.
pub fn record_cache_event(event: &'static str) {
    counter!("route_cache_events_total", "event" => event).increment(1);
}
