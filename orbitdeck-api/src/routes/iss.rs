//! ISS telemetry passthrough routes.
//!
//! Bodies from the telemetry service are forwarded unchanged. Failures come
//! back as `ok:false` envelopes with HTTP 200.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;

use crate::aggregator::ProxyAggregator;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct TrendParams {
    /// Window in hours, clamped to 1..=168 (default 24).
    pub hours: Option<String>,
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/iss/latest - Most recent ISS position
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/iss/latest",
    tag = "ISS",
    responses(
        (status = 200, description = "Envelope with the latest fix", body = orbitdeck_core::Envelope),
    ),
))]
pub async fn latest(State(proxy): State<ProxyAggregator>) -> Json<Value> {
    Json(proxy.iss_latest().await)
}

/// GET /api/iss/trend - ISS movement over a window
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/iss/trend",
    tag = "ISS",
    params(TrendParams),
    responses(
        (status = 200, description = "Envelope with the trend", body = orbitdeck_core::Envelope),
    ),
))]
pub async fn trend(
    State(proxy): State<ProxyAggregator>,
    Query(params): Query<TrendParams>,
) -> Json<Value> {
    Json(proxy.iss_trend(params.hours.as_deref()).await)
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/latest", get(latest))
        .route("/last", get(latest))
        .route("/trend", get(trend))
}
