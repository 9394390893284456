//! Dataset catalog routes: listing passthrough and CSV export.

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use orbitdeck_upstream::CatalogQuery;

use crate::aggregator::ProxyAggregator;
use crate::error::ApiResult;
use crate::export::ExportService;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct ListParams {
    /// Page size, clamped to 1..=100 (default 20).
    pub limit: Option<String>,
    /// Rows to skip (default 0).
    pub offset: Option<String>,
    /// Free-text filter; blank is ignored.
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct ExportParams {
    /// Prior snapshot to export instead of the current catalog.
    pub snapshot: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SnapshotList {
    pub snapshots: Vec<String>,
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/osdr - Dataset catalog listing
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/osdr",
    tag = "OSDR",
    params(ListParams),
    responses(
        (status = 200, description = "Envelope with catalog items", body = orbitdeck_core::Envelope),
    ),
))]
pub async fn list(
    State(proxy): State<ProxyAggregator>,
    Query(params): Query<ListParams>,
) -> Json<Value> {
    let query = CatalogQuery::from_params(
        params.limit.as_deref(),
        params.offset.as_deref(),
        params.search.as_deref(),
    );
    Json(proxy.osdr_list(&query).await)
}

/// GET /api/osdr/export - CSV download
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/osdr/export",
    tag = "OSDR",
    params(ExportParams),
    responses(
        (status = 200, description = "UTF-8 CSV with BOM", content_type = "text/csv"),
        (status = 400, description = "Malformed snapshot name", body = crate::error::ApiError),
        (status = 404, description = "Unknown snapshot", body = crate::error::ApiError),
    ),
))]
pub async fn export(
    State(service): State<ExportService>,
    Query(params): Query<ExportParams>,
) -> ApiResult<impl IntoResponse> {
    let snapshot = params.snapshot.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let csv = service.export(snapshot).await?;
    let disposition = format!("attachment; filename=\"{}\"", csv.filename);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv.body,
    ))
}

/// GET /api/osdr/exports - Prior export snapshots, newest first
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/osdr/exports",
    tag = "OSDR",
    responses(
        (status = 200, description = "Snapshot names", body = SnapshotList),
        (status = 503, description = "Database unavailable", body = crate::error::ApiError),
    ),
))]
pub async fn snapshots(State(service): State<ExportService>) -> ApiResult<Json<SnapshotList>> {
    let names = service.snapshots().await?;
    Ok(Json(SnapshotList {
        snapshots: names.into_iter().map(String::from).collect(),
    }))
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/export", get(export))
        .route("/exports", get(snapshots))
}
