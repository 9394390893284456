//! Astronomy routes.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;

use crate::aggregator::AstroAggregator;
use crate::state::AppState;

/// Observer location and window. Unparsable values fall back to defaults.
#[derive(Debug, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct ObserverParams {
    /// Latitude, default 55.7558, clamped to ±90.
    pub lat: Option<String>,
    /// Longitude, default 37.6176, clamped to ±180.
    pub lon: Option<String>,
    /// Days ahead, clamped to 1..=365 (default 7).
    pub days: Option<String>,
}

/// GET /api/astro/events - Sun and moon events
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/astro/events",
    tag = "Astronomy",
    params(ObserverParams),
    responses(
        (status = 200, description = "Envelope with `source`, `from`, `to` and `events`", body = orbitdeck_core::Envelope),
    ),
))]
pub async fn events(
    State(astro): State<AstroAggregator>,
    Query(params): Query<ObserverParams>,
) -> Json<Value> {
    Json(
        astro
            .events(params.lat.as_deref(), params.lon.as_deref(), params.days.as_deref())
            .await,
    )
}

/// GET /api/astro/positions - Body positions
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/astro/positions",
    tag = "Astronomy",
    params(ObserverParams),
    responses(
        (status = 200, description = "Envelope; UNAUTHENTICATED without credentials", body = orbitdeck_core::Envelope),
    ),
))]
pub async fn positions(
    State(astro): State<AstroAggregator>,
    Query(params): Query<ObserverParams>,
) -> Json<Value> {
    Json(
        astro
            .positions(params.lat.as_deref(), params.lon.as_deref(), params.days.as_deref())
            .await,
    )
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/events", get(events))
        .route("/positions", get(positions))
}
