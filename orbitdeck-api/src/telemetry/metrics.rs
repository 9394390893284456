//! Prometheus Metrics Definitions
//!
//! Defines all orbitdeck metrics with their labels and exposes a /metrics
//! endpoint for Prometheus scraping.

use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

use crate::error::{ApiError, ApiResult};

/// HTTP request latency buckets (seconds)
/// Covers: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0,
];

/// Upstream call latency buckets (seconds), up to the longest timeout
const UPSTREAM_LATENCY_BUCKETS: &[f64] = &[0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0, 15.0];

/// Database operation latency buckets (seconds)
const DB_LATENCY_BUCKETS: &[f64] =
    &[0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0];

/// Global metrics instance - initialized once per process
pub static METRICS: Lazy<ApiResult<OrbitdeckMetrics>> = Lazy::new(OrbitdeckMetrics::new);

/// The registered metrics, or `None` if registration failed.
pub fn metrics() -> Option<&'static OrbitdeckMetrics> {
    METRICS.as_ref().ok()
}

/// Container for all orbitdeck metrics.
#[derive(Clone)]
pub struct OrbitdeckMetrics {
    /// HTTP request counter - labels: method, path, status
    pub http_requests_total: CounterVec,

    /// HTTP request duration histogram - labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// Upstream call counter - labels: provider, outcome
    pub upstream_calls_total: CounterVec,

    /// Upstream call duration histogram - labels: provider
    pub upstream_call_duration_seconds: HistogramVec,

    /// Fallback datasets served - labels: feed
    pub fallbacks_total: CounterVec,

    /// Response cache lookups - labels: endpoint, outcome (hit/miss)
    pub cache_lookups_total: CounterVec,

    /// Database operation counter - labels: operation, status
    pub db_operations_total: CounterVec,

    /// Database operation duration histogram - labels: operation
    pub db_operation_duration_seconds: HistogramVec,
}

impl OrbitdeckMetrics {
    /// Create and register all metrics with Prometheus.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "orbitdeck_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register http_requests_total: {}", e)))?,

            http_request_duration_seconds: register_histogram_vec!(
                "orbitdeck_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register http_request_duration_seconds: {}", e)))?,

            upstream_calls_total: register_counter_vec!(
                "orbitdeck_upstream_calls_total",
                "Total number of upstream provider calls",
                &["provider", "outcome"]
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register upstream_calls_total: {}", e)))?,

            upstream_call_duration_seconds: register_histogram_vec!(
                "orbitdeck_upstream_call_duration_seconds",
                "Upstream provider call duration in seconds",
                &["provider"],
                UPSTREAM_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register upstream_call_duration_seconds: {}", e)))?,

            fallbacks_total: register_counter_vec!(
                "orbitdeck_fallbacks_total",
                "Total number of fallback datasets served",
                &["feed"]
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register fallbacks_total: {}", e)))?,

            cache_lookups_total: register_counter_vec!(
                "orbitdeck_cache_lookups_total",
                "Total number of response cache lookups",
                &["endpoint", "outcome"]
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register cache_lookups_total: {}", e)))?,

            db_operations_total: register_counter_vec!(
                "orbitdeck_db_operations_total",
                "Total number of database operations",
                &["operation", "status"]
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register db_operations_total: {}", e)))?,

            db_operation_duration_seconds: register_histogram_vec!(
                "orbitdeck_db_operation_duration_seconds",
                "Database operation duration in seconds",
                &["operation"],
                DB_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register db_operation_duration_seconds: {}", e)))?,
        })
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    /// Record one upstream call. `outcome` is `ok` or the lowercased error code.
    pub fn record_upstream_call(&self, provider: &str, outcome: &str, duration_secs: f64) {
        self.upstream_calls_total
            .with_label_values(&[provider, outcome])
            .inc();
        self.upstream_call_duration_seconds
            .with_label_values(&[provider])
            .observe(duration_secs);
    }

    /// Record a fallback dataset being served.
    pub fn record_fallback(&self, feed: &str) {
        self.fallbacks_total.with_label_values(&[feed]).inc();
    }

    /// Record a response cache lookup.
    pub fn record_cache_lookup(&self, endpoint: &str, hit: bool) {
        let outcome = if hit { "hit" } else { "miss" };
        self.cache_lookups_total
            .with_label_values(&[endpoint, outcome])
            .inc();
    }

    /// Record a database operation.
    pub fn record_db_operation(&self, operation: &str, success: bool, duration_secs: f64) {
        let status = if success { "success" } else { "error" };
        self.db_operations_total
            .with_label_values(&[operation, status])
            .inc();
        self.db_operation_duration_seconds
            .with_label_values(&[operation])
            .observe(duration_secs);
    }
}

/// Handler for GET /metrics endpoint.
///
/// Returns Prometheus text format metrics.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/metrics",
    tag = "Observability",
    responses(
        (status = 200, description = "Prometheus metrics in text format", content_type = "text/plain"),
        (status = 500, description = "Failed to encode metrics"),
    ),
))]
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}
