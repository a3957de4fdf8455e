//! Metrics definitions for the meeting session.
//!
//! All metrics follow Prometheus naming conventions:
//! - `session_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded by enums in this crate:
//! - `event`: one value per `SessionEvent` variant
//! - `command`: one value per coordinator command
//! - `mode`: 3 capture pipeline modes
//! - `operation`: `join`, `leave`

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Duration;

/// Install the Prometheus exporter with an HTTP listener on `bind_address`.
///
/// Must be called from within a Tokio runtime, before any metric is recorded.
///
/// # Errors
///
/// Returns error if the address is invalid or a recorder is already installed.
pub fn init_metrics_recorder(bind_address: &str) -> Result<(), String> {
    let addr: SocketAddr = bind_address
        .parse()
        .map_err(|e| format!("Invalid metrics bind address {bind_address}: {e}"))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        // Mutations are in-memory; anything above a few ms is a backlog.
        .set_buckets_for_metric(
            Matcher::Prefix("session_event".to_string()),
            &[0.0001, 0.0005, 0.001, 0.005, 0.010, 0.025, 0.050, 0.100],
        )
        .map_err(|e| format!("Failed to set event latency buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("session_api".to_string()),
            &[0.010, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000],
        )
        .map_err(|e| format!("Failed to set API latency buckets: {e}"))?
        .install()
        .map_err(|e| format!("Failed to install Prometheus metrics recorder: {e}"))
}

/// Record one processed engine event.
///
/// Metric: `session_events_total`, `session_event_duration_seconds`
/// Labels: `event`
pub fn record_event(event: &'static str, duration: Duration) {
    counter!("session_events_total", "event" => event).increment(1);
    histogram!("session_event_duration_seconds", "event" => event).record(duration.as_secs_f64());
}

/// Record one processed user command.
///
/// Metric: `session_commands_total`
/// Labels: `command`
pub fn record_command(command: &'static str) {
    counter!("session_commands_total", "command" => command).increment(1);
}

/// Record one emitted view update.
///
/// Metric: `session_view_updates_total`
pub fn record_view_update() {
    counter!("session_view_updates_total").increment(1);
}

/// Record a refused capture mode request.
///
/// Metric: `session_capture_rejections_total`
/// Labels: `mode` (the requested mode)
pub fn record_capture_rejection(mode: &'static str) {
    counter!("session_capture_rejections_total", "mode" => mode).increment(1);
}

/// Record a command refused because the mailbox was full.
///
/// Metric: `session_commands_rejected_total`
pub fn record_command_rejected() {
    counter!("session_commands_rejected_total").increment(1);
}

/// Set the coordinator mailbox depth.
///
/// Metric: `session_mailbox_depth`
pub fn set_mailbox_depth(depth: usize) {
    // usize to f64 is exact for realistic mailbox depths (< 2^53)
    #[allow(clippy::cast_precision_loss)]
    gauge!("session_mailbox_depth").set(depth as f64);
}

/// Set the number of tiles on the current page.
///
/// Metric: `session_visible_tiles`
pub fn set_visible_tiles(count: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("session_visible_tiles").set(count as f64);
}

/// Record a join/leave HTTP exchange.
///
/// Metric: `session_api_requests_total`, `session_api_duration_seconds`
/// Labels: `operation`, `status` (success, error)
pub fn record_api_request(operation: &'static str, status: &'static str, duration: Duration) {
    counter!("session_api_requests_total", "operation" => operation, "status" => status)
        .increment(1);
    histogram!("session_api_duration_seconds", "operation" => operation)
        .record(duration.as_secs_f64());
}
