//! Health Check Endpoints
//!
//! - /health - Aggregate report: database, telemetry service and every
//!   external provider
//! - /health/ping - Simple liveness check
//! - /health/live - Process alive check
//!
//! A database outage makes the service unhealthy (503). An unreachable
//! upstream only degrades it: every feed has a fallback or an `ok:false`
//! answer, so the process keeps serving.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use futures_util::future::join_all;
use orbitdeck_storage::ResponseCache;
use orbitdeck_upstream::UpstreamClient;
use serde::{Deserialize, Serialize};

use crate::db::DatabaseHealth;
use crate::state::AppState;

// ============================================================================
// TYPES
// ============================================================================

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthResponse {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HealthDetails>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Degraded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthDetails {
    pub database: ComponentHealth,
    /// Keyed by provider name.
    pub upstreams: BTreeMap<String, ComponentHealth>,
    pub cache: CacheHealth,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ComponentHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CacheHealth {
    pub hits: u64,
    pub misses: u64,
    pub entries: u64,
}

// ============================================================================
// STATE
// ============================================================================

pub struct HealthState {
    pub database: Arc<dyn DatabaseHealth>,
    pub upstreams: Vec<Arc<dyn UpstreamClient>>,
    pub cache: Arc<ResponseCache>,
    pub start_time: Instant,
}

impl HealthState {
    pub fn new(
        database: Arc<dyn DatabaseHealth>,
        upstreams: Vec<Arc<dyn UpstreamClient>>,
        cache: Arc<ResponseCache>,
        start_time: Instant,
    ) -> Self {
        Self {
            database,
            upstreams,
            cache,
            start_time,
        }
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /health/ping - Simple pong response
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/health/ping",
    tag = "Health",
    responses(
        (status = 200, description = "Service is responding", body = String),
    ),
))]
pub async fn ping() -> impl IntoResponse {
    (StatusCode::OK, "pong")
}

/// GET /health/live - Process liveness check
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Process is alive", body = HealthResponse),
    ),
))]
pub async fn liveness() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        message: Some("Process is alive".to_string()),
        details: None,
    };
    (StatusCode::OK, Json(response))
}

/// GET /health - Database and upstream reachability
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Healthy or degraded", body = HealthResponse),
        (status = 503, description = "Database unavailable", body = HealthResponse),
    ),
))]
pub async fn health(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    let (database, upstreams) = tokio::join!(
        check_database(state.database.as_ref()),
        check_upstreams(&state.upstreams),
    );

    let overall_status = overall(&database, upstreams.values());
    let stats = state.cache.stats().await;

    let response = HealthResponse {
        status: overall_status,
        message: None,
        details: Some(HealthDetails {
            database,
            upstreams,
            cache: CacheHealth {
                hits: stats.hits,
                misses: stats.misses,
                entries: stats.entry_count,
            },
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: state.start_time.elapsed().as_secs(),
        }),
    };

    let status_code = if overall_status == HealthStatus::Unhealthy {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (status_code, Json(response))
}

async fn check_database(db: &dyn DatabaseHealth) -> ComponentHealth {
    let start = Instant::now();
    match db.health_check().await {
        Ok(()) => ComponentHealth {
            status: HealthStatus::Healthy,
            latency_ms: Some(start.elapsed().as_millis() as u64),
            error: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, "database health check failed");
            ComponentHealth {
                status: HealthStatus::Unhealthy,
                latency_ms: None,
                error: Some(format!("Database check failed: {}", e.message)),
            }
        }
    }
}

async fn check_upstreams(clients: &[Arc<dyn UpstreamClient>]) -> BTreeMap<String, ComponentHealth> {
    let probes = join_all(clients.iter().map(|client| client.probe())).await;
    clients
        .iter()
        .zip(probes)
        .map(|(client, probe)| {
            let status = if probe.reachable {
                HealthStatus::Healthy
            } else {
                HealthStatus::Unhealthy
            };
            let component = ComponentHealth {
                status,
                latency_ms: Some(probe.latency_ms),
                error: probe.error,
            };
            (client.provider().as_str().to_string(), component)
        })
        .collect()
}

fn overall<'a>(
    database: &ComponentHealth,
    upstreams: impl IntoIterator<Item = &'a ComponentHealth>,
) -> HealthStatus {
    if database.status != HealthStatus::Healthy {
        return HealthStatus::Unhealthy;
    }
    if upstreams
        .into_iter()
        .any(|c| c.status != HealthStatus::Healthy)
    {
        return HealthStatus::Degraded;
    }
    HealthStatus::Healthy
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create health check router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(health))
        .route("/ping", get(ping))
        .route("/live", get(liveness))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(status: HealthStatus) -> ComponentHealth {
        ComponentHealth {
            status,
            latency_ms: Some(3),
            error: None,
        }
    }

    #[test]
    fn test_health_response_serialization() -> Result<(), serde_json::Error> {
        let response = HealthResponse {
            status: HealthStatus::Degraded,
            message: None,
            details: None,
        };

        let json = serde_json::to_string(&response)?;
        assert_eq!(json, r#"{"status":"degraded"}"#);
        Ok(())
    }

    #[test]
    fn test_overall_status() {
        let up = component(HealthStatus::Healthy);
        let down = component(HealthStatus::Unhealthy);

        assert_eq!(overall(&up, [&up, &up]), HealthStatus::Healthy);
        assert_eq!(overall(&up, [&up, &down]), HealthStatus::Degraded);
        assert_eq!(overall(&down, [&up]), HealthStatus::Unhealthy);
        assert_eq!(overall(&up, std::iter::empty::<&ComponentHealth>()), HealthStatus::Healthy);
    }

    #[test]
    fn test_component_health_with_error() -> Result<(), serde_json::Error> {
        let component = ComponentHealth {
            status: HealthStatus::Unhealthy,
            latency_ms: None,
            error: Some("Connection refused".to_string()),
        };

        let json = serde_json::to_string(&component)?;
        assert!(json.contains("\"status\":\"unhealthy\""));
        assert!(json.contains("Connection refused"));
        Ok(())
    }
}
