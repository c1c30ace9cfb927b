//! Prometheus metrics for application observability.
//!
//! Metrics are exposed by a dedicated Prometheus HTTP listener
//! (default: `0.0.0.0:9090`). Recording before [`init_metrics`] runs, or when
//! metrics are disabled, is a no-op.
//!
//! # Available Metrics
//!
//! ## Counters
//! - `image_api_requests_total` - Requests served (labels: method, status)
//! - `image_api_auth_failures_total` - Rejected by the API key gate (labels: reason)
//! - `image_api_uploads_total` - Upload attempts (labels: outcome)
//! - `image_api_analyses_total` - Analysis attempts (labels: outcome)
//!
//! ## Histograms
//! - `image_api_request_duration_seconds` - Request duration (labels: method, status)
//! - `image_api_upload_bytes` - Size of stored uploads

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{error, info};

/// Metric names as constants for consistency.
pub mod names {
    pub const REQUESTS_TOTAL: &str = "image_api_requests_total";
    pub const REQUEST_DURATION_SECONDS: &str = "image_api_request_duration_seconds";
    pub const AUTH_FAILURES_TOTAL: &str = "image_api_auth_failures_total";
    pub const UPLOADS_TOTAL: &str = "image_api_uploads_total";
    pub const UPLOAD_BYTES: &str = "image_api_upload_bytes";
    pub const ANALYSES_TOTAL: &str = "image_api_analyses_total";
}

/// Install the Prometheus exporter and describe all metrics.
///
/// # Errors
///
/// Returns a message when the exporter cannot be installed (port in use,
/// recorder already set).
pub fn init_metrics(metrics_addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(names::REQUESTS_TOTAL, "Total number of HTTP requests served");
    describe_counter!(
        names::AUTH_FAILURES_TOTAL,
        "Total number of requests rejected by API key authentication"
    );
    describe_counter!(names::UPLOADS_TOTAL, "Total number of image upload attempts");
    describe_counter!(names::ANALYSES_TOTAL, "Total number of image analysis attempts");

    describe_histogram!(
        names::REQUEST_DURATION_SECONDS,
        "HTTP request duration in seconds"
    );
    describe_histogram!(names::UPLOAD_BYTES, "Size of stored uploads in bytes");

    info!(addr = %metrics_addr, "Prometheus metrics endpoint started");
    Ok(())
}

/// Try to initialize metrics, logging any errors but not failing.
pub fn try_init_metrics(metrics_addr: SocketAddr) {
    if let Err(e) = init_metrics(metrics_addr) {
        error!(error = %e, "Failed to initialize metrics, continuing without metrics");
    }
}

/// Record a served request and its duration.
pub fn record_request(method: &str, status: u16, duration: Duration) {
    let status = status.to_string();
    counter!(names::REQUESTS_TOTAL, "method" => method.to_string(), "status" => status.clone())
        .increment(1);
    histogram!(names::REQUEST_DURATION_SECONDS, "method" => method.to_string(), "status" => status)
        .record(duration.as_secs_f64());
}

/// Record an authentication rejection (`missing` or `invalid`).
pub fn record_auth_failure(reason: &'static str) {
    counter!(names::AUTH_FAILURES_TOTAL, "reason" => reason).increment(1);
}

/// Record an upload attempt; `bytes` is recorded for stored uploads only.
pub fn record_upload(outcome: &'static str, bytes: Option<usize>) {
    counter!(names::UPLOADS_TOTAL, "outcome" => outcome).increment(1);
    if let Some(bytes) = bytes {
        histogram!(names::UPLOAD_BYTES).record(bytes as f64);
    }
}

/// Record an analysis attempt.
pub fn record_analysis(outcome: &'static str) {
    counter!(names::ANALYSES_TOTAL, "outcome" => outcome).increment(1);
}
