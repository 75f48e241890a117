//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_http_requests_total` (counter): HTTP requests by method, route, status
//! - `gateway_http_request_duration_seconds` (histogram): HTTP latency
//! - `trans_commands_total` (counter): Trans commands by command, outcome
//! - `trans_command_duration_seconds` (histogram): Trans round trip latency
//! - `trans_connect_retries_total` (counter): dial retries
//! - `gateway_events_total` (counter): use case events (bad input, repository error)
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use metrics::Label;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter with its own HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    let labels = vec![
        Label::new("method", method.to_string()),
        Label::new("route", route.to_string()),
    ];
    let mut with_status = labels.clone();
    with_status.push(Label::new("status", status.to_string()));
    metrics::counter!("gateway_http_requests_total", with_status).increment(1);
    metrics::histogram!("gateway_http_request_duration_seconds", labels)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_command(command: &str, outcome: &'static str, start: Instant) {
    metrics::counter!(
        "trans_commands_total",
        "command" => command.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("trans_command_duration_seconds", "command" => command.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_retry() {
    metrics::counter!("trans_connect_retries_total").increment(1);
}

pub fn record_event(event: &'static str) {
    metrics::counter!("gateway_events_total", "event" => event).increment(1);
}
