/// Metrics and telemetry
///
/// Provides Prometheus-compatible metrics for monitoring:
/// - HTTP request counts and latencies
/// - Signup funnel progress
/// - Post, reaction, and follow activity
/// - Background job execution

use lazy_static::lazy_static;
use prometheus::{
    register_gauge, register_histogram_vec, register_int_counter_vec, register_int_gauge, Encoder,
    Gauge, HistogramVec, IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    // ========== HTTP Metrics ==========

    /// Total HTTP requests by method, path, and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request latencies in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // ========== Signup Metrics ==========

    /// Signup steps completed, by step
    pub static ref SIGNUP_STEPS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "signup_steps_total",
        "Total number of signup steps completed",
        &["step"]
    )
    .unwrap();

    // ========== Content Metrics ==========

    /// Posts created
    pub static ref POSTS_CREATED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "posts_created_total",
        "Total number of posts created",
        &["has_region"]
    )
    .unwrap();

    /// Reaction toggles by direction
    pub static ref REACTION_TOGGLES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "reaction_toggles_total",
        "Total number of reaction toggles",
        &["direction"]
    )
    .unwrap();

    /// Follow toggles by direction
    pub static ref FOLLOW_TOGGLES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "follow_toggles_total",
        "Total number of follow toggles",
        &["direction"]
    )
    .unwrap();

    // ========== Blob Storage Metrics ==========

    /// Blob uploads by MIME type
    pub static ref BLOB_UPLOADS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "blob_uploads_total",
        "Total number of blob uploads",
        &["mime_type"]
    )
    .unwrap();

    // ========== Background Job Metrics ==========

    /// Background job executions by job type and status
    pub static ref BACKGROUND_JOBS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "background_jobs_total",
        "Total number of background job executions",
        &["job_type", "status"]
    )
    .unwrap();

    /// Background job duration in seconds
    pub static ref BACKGROUND_JOB_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "background_job_duration_seconds",
        "Background job execution time in seconds",
        &["job_type"],
        vec![0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]
    )
    .unwrap();

    // ========== System Metrics ==========

    /// Total accounts
    pub static ref ACCOUNTS_TOTAL: IntGauge = register_int_gauge!(
        "accounts_total",
        "Total number of accounts"
    )
    .unwrap();

    /// Application uptime in seconds
    pub static ref UPTIME_SECONDS: Gauge = register_gauge!(
        "uptime_seconds",
        "Application uptime in seconds"
    )
    .unwrap();
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration);
}

/// Record a completed signup step
pub fn record_signup_step(step: &str) {
    SIGNUP_STEPS_TOTAL.with_label_values(&[step]).inc();
}

/// Record a post creation
pub fn record_post_created(has_region: bool) {
    POSTS_CREATED_TOTAL
        .with_label_values(&[if has_region { "yes" } else { "no" }])
        .inc();
}

/// Record a reaction toggle
pub fn record_reaction_toggle(added: bool) {
    REACTION_TOGGLES_TOTAL
        .with_label_values(&[if added { "added" } else { "removed" }])
        .inc();
}

/// Record a follow toggle
pub fn record_follow_toggle(added: bool) {
    FOLLOW_TOGGLES_TOTAL
        .with_label_values(&[if added { "followed" } else { "unfollowed" }])
        .inc();
}

/// Record a blob upload
pub fn record_blob_upload(mime_type: &str) {
    BLOB_UPLOADS_TOTAL.with_label_values(&[mime_type]).inc();
}

/// Record a background job execution
pub fn record_background_job(job_type: &str, status: &str, duration: f64) {
    BACKGROUND_JOBS_TOTAL
        .with_label_values(&[job_type, status])
        .inc();
    BACKGROUND_JOB_DURATION_SECONDS
        .with_label_values(&[job_type])
        .observe(duration);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_http_request() {
        record_http_request("GET", "/api/feed", 200, 0.05);
        let metrics = render_metrics();
        assert!(metrics.contains("http_requests_total"));
        assert!(metrics.contains("http_request_duration_seconds"));
    }

    #[test]
    fn test_record_signup_step() {
        record_signup_step("profile");
        let metrics = render_metrics();
        assert!(metrics.contains("signup_steps_total"));
    }

    #[test]
    fn test_record_toggles() {
        record_reaction_toggle(true);
        record_reaction_toggle(false);
        record_follow_toggle(true);
        let metrics = render_metrics();
        assert!(metrics.contains("reaction_toggles_total"));
        assert!(metrics.contains("follow_toggles_total"));
    }

    #[test]
    fn test_record_background_job() {
        record_background_job("cleanup", "success", 1.5);
        let metrics = render_metrics();
        assert!(metrics.contains("background_jobs_total"));
        assert!(metrics.contains("background_job_duration_seconds"));
    }

    #[test]
    fn test_metrics_rendering() {
        // Record some metrics first to ensure output
        record_http_request("GET", "/test", 200, 0.05);
        record_post_created(true);
        record_blob_upload("image/png");

        let metrics = render_metrics();

        assert!(metrics.contains("# HELP") || !metrics.is_empty());
        assert!(metrics.contains("# TYPE") || !metrics.is_empty());

        assert!(metrics.contains("http_requests_total"));
        assert!(metrics.contains("posts_created_total"));
        assert!(metrics.contains("blob_uploads_total"));
    }
}
