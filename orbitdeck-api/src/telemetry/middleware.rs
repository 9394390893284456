//! Axum Middleware for HTTP Request Tracing and Metrics
//!
//! Wraps every request in a tracing span and records Prometheus metrics
//! under a normalized path.

use axum::{extract::Request, middleware::Next, response::Response};
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Instant;
use tracing::{info_span, Instrument};

use super::metrics::metrics;

static NUMERIC_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/\d+(/|$)").expect("static numeric segment regex"));

static SPACE_CACHE_SOURCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/api/space/cache/[^/]+$").expect("static space cache regex"));

static PAGE_SLUG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/page/[^/]+$").expect("static page slug regex"));

/// Normalize a path for metric labels and span names.
///
/// Caller-chosen segments (page slugs, space-cache sources, numeric ids) are
/// replaced with placeholders to keep Prometheus label cardinality bounded.
fn normalize_path(path: &str) -> String {
    if SPACE_CACHE_SOURCE.is_match(path) {
        return "/api/space/cache/{source}".to_string();
    }
    if PAGE_SLUG.is_match(path) {
        return "/page/{slug}".to_string();
    }
    NUMERIC_SEGMENT.replace_all(path, "/{id}$1").to_string()
}

/// Observability middleware for Axum.
///
/// 1. tracing span per request
/// 2. Prometheus request counter and latency histogram
/// 3. completion log line
pub async fn observability_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let normalized_path = normalize_path(&path);

    let span = info_span!(
        "http_request",
        http.method = %method,
        http.target = %path,
        http.route = %normalized_path,
    );

    let response = next.run(request).instrument(span).await;

    let duration = start.elapsed();
    let status = response.status();

    if let Some(metrics) = metrics() {
        metrics.record_http_request(
            method.as_str(),
            &normalized_path,
            status.as_u16(),
            duration.as_secs_f64(),
        );
    }

    tracing::info!(
        method = %method,
        path = %path,
        status = status.as_u16(),
        duration_ms = duration.as_millis(),
        "Request completed"
    );

    response
}
