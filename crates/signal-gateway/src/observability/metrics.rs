//! Metrics definitions for the Signal Gateway.
//!
//! All metrics follow Prometheus naming conventions:
//! - `signal_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `method`: HTTP verbs
//! - `endpoint`: the four routes plus `/other`
//! - `status`: success, error, timeout (HTTP); status code (connect, relay)
//! - `rpc`: the three signal bus methods

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("signal_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.150, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("signal_bus_call".to_string()),
            &[
                0.002, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500,
            ],
        )
        .map_err(|e| format!("Failed to set signal bus buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `signal_http_requests_total`, `signal_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("signal_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("signal_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Map a request path onto its route template.
fn normalize_endpoint(path: &str) -> &'static str {
    match path {
        "/health" => "/health",
        "/metrics" => "/metrics",
        "/rtc/v2" => "/rtc/v2",
        _ => match path.strip_prefix("/rtc/v2/") {
            Some(rest) if !rest.is_empty() && !rest.contains('/') => "/rtc/v2/{participant_id}",
            _ => "/other",
        },
    }
}

// ============================================================================
// Signaling Metrics
// ============================================================================

/// Record a connect outcome.
///
/// Metric: `signal_connect_total`
/// Labels: `status`
pub fn record_connect(status_code: u16) {
    counter!("signal_connect_total", "status" => status_code.to_string()).increment(1);
}

/// Record a participant relay outcome.
///
/// Metric: `signal_relay_total`
/// Labels: `status`
pub fn record_relay(status_code: u16) {
    counter!("signal_relay_total", "status" => status_code.to_string()).increment(1);
}

/// Record a unary call over the signal bus.
///
/// Metric: `signal_bus_calls_total`, `signal_bus_call_duration_seconds`
/// Labels: `rpc`, `status`
///
/// Status values: "success", "error", "transport_error"
pub fn record_bus_call(rpc: &'static str, status: &'static str, duration: Duration) {
    histogram!("signal_bus_call_duration_seconds", "rpc" => rpc).record(duration.as_secs_f64());

    counter!("signal_bus_calls_total",
        "rpc" => rpc,
        "status" => status
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    // Recording without an installed recorder goes to the no-op recorder;
    // these tests exercise the label handling.

    #[test]
    fn test_record_http_request() {
        record_http_request("POST", "/rtc/v2", 200, Duration::from_millis(20));
        record_http_request("PATCH", "/rtc/v2/PA_abc", 404, Duration::from_millis(5));
        record_http_request("GET", "/health", 200, Duration::from_millis(1));
        record_http_request("POST", "/rtc/v2", 504, Duration::from_secs(30));
    }

    #[test]
    fn test_categorize_status_code() {
        assert_eq!(categorize_status_code(200), "success");
        assert_eq!(categorize_status_code(204), "success");
        assert_eq!(categorize_status_code(408), "timeout");
        assert_eq!(categorize_status_code(504), "timeout");
        assert_eq!(categorize_status_code(400), "error");
        assert_eq!(categorize_status_code(401), "error");
        assert_eq!(categorize_status_code(500), "error");
    }

    #[test]
    fn test_normalize_endpoint_known_paths() {
        assert_eq!(normalize_endpoint("/health"), "/health");
        assert_eq!(normalize_endpoint("/metrics"), "/metrics");
        assert_eq!(normalize_endpoint("/rtc/v2"), "/rtc/v2");
        assert_eq!(
            normalize_endpoint("/rtc/v2/PA_8f2kq"),
            "/rtc/v2/{participant_id}"
        );
    }

    #[test]
    fn test_normalize_endpoint_unknown_paths() {
        assert_eq!(normalize_endpoint("/"), "/other");
        assert_eq!(normalize_endpoint("/rtc/v2/"), "/other");
        assert_eq!(normalize_endpoint("/rtc/v2/PA_1/extra"), "/other");
        assert_eq!(normalize_endpoint("/rtc/v1"), "/other");
    }

    #[test]
    fn test_record_signaling_outcomes() {
        record_connect(200);
        record_connect(401);
        record_relay(404);
        record_bus_call(
            "/signal.internal.ParticipantRelay/RelayParticipant",
            "transport_error",
            Duration::from_millis(3),
        );
    }
}
