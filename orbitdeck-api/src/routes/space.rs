//! Space feed routes: telemetry-service cache passthrough plus NASA and
//! SpaceX feeds with fallbacks.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;

use crate::aggregator::{ProxyAggregator, SpaceAggregator};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct ApodParams {
    /// `YYYY-MM-DD`, today when absent or invalid.
    pub date: Option<String>,
    /// Random pictures, clamped to 1..=10 (default 1).
    pub count: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct DateRangeParams {
    /// `YYYY-MM-DD`
    pub start_date: Option<String>,
    /// `YYYY-MM-DD`
    pub end_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct LaunchParams {
    /// Launch count, clamped to 1..=50 (default 10).
    pub limit: Option<String>,
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/space/cache/{source} - Feed cached by the telemetry service
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/space/cache/{source}",
    tag = "Space",
    params(("source" = String, Path, description = "apod, neo, flr, cme or spacex")),
    responses(
        (status = 200, description = "Envelope; INVALID_SOURCE for other names", body = orbitdeck_core::Envelope),
    ),
))]
pub async fn cached_source(
    State(proxy): State<ProxyAggregator>,
    Path(source): Path<String>,
) -> Json<Value> {
    Json(proxy.space_cache(&source).await)
}

/// GET /api/space/apod - Astronomy Picture of the Day
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/space/apod",
    tag = "Space",
    params(ApodParams),
    responses(
        (status = 200, description = "Envelope with `items`", body = orbitdeck_core::Envelope),
    ),
))]
pub async fn apod(
    State(space): State<SpaceAggregator>,
    Query(params): Query<ApodParams>,
) -> Json<Value> {
    Json(space.apod(params.date.as_deref(), params.count.as_deref()).await)
}

/// GET /api/space/neo - Near-earth objects
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/space/neo",
    tag = "Space",
    params(DateRangeParams),
    responses(
        (status = 200, description = "Envelope with `asteroids`", body = orbitdeck_core::Envelope),
    ),
))]
pub async fn neo(
    State(space): State<SpaceAggregator>,
    Query(params): Query<DateRangeParams>,
) -> Json<Value> {
    Json(space.neo(params.start_date.as_deref(), params.end_date.as_deref()).await)
}

/// GET /api/space/donki - Solar flares
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/space/donki",
    tag = "Space",
    params(DateRangeParams),
    responses(
        (status = 200, description = "Envelope with `events`", body = orbitdeck_core::Envelope),
    ),
))]
pub async fn donki(
    State(space): State<SpaceAggregator>,
    Query(params): Query<DateRangeParams>,
) -> Json<Value> {
    Json(space.donki(params.start_date.as_deref(), params.end_date.as_deref()).await)
}

/// GET /api/space/spacex - Recent launches
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/space/spacex",
    tag = "Space",
    params(LaunchParams),
    responses(
        (status = 200, description = "Envelope with `launches`", body = orbitdeck_core::Envelope),
    ),
))]
pub async fn spacex(
    State(space): State<SpaceAggregator>,
    Query(params): Query<LaunchParams>,
) -> Json<Value> {
    Json(space.spacex(params.limit.as_deref()).await)
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/cache/:source", get(cached_source))
        .route("/apod", get(apod))
        .route("/neo", get(neo))
        .route("/donki", get(donki))
        .route("/spacex", get(spacex))
}
