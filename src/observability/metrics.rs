//! Metrics collection and exposition.
//!
//! # Metrics
//! - `snippetbox_requests_total` (counter): requests by method and status
//! - `snippetbox_panics_total` (counter): handler panics caught by the recovery layer
//! - `snippetbox_csrf_rejections_total` (counter): unsafe requests refused by the CSRF guard

use std::net::SocketAddr;

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16) {
    counter!(
        "snippetbox_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_panic() {
    counter!("snippetbox_panics_total").increment(1);
}

pub fn record_csrf_rejection() {
    counter!("snippetbox_csrf_rejections_total").increment(1);
}
