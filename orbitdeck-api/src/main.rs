//! orbitdeck API Server Entry Point
//!
//! Bootstraps configuration, wires upstream clients and the Postgres pool,
//! and starts the Axum HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use orbitdeck_api::telemetry::{init_tracing, metrics, TelemetryConfig};
use orbitdeck_api::{
    create_api_router, ApiConfig, ApiError, ApiResult, AppState, Backends, DbClient, DbConfig,
    UpstreamConfig, Upstreams,
};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::default();
    init_tracing(&telemetry_config)?;
    if telemetry_config.metrics_enabled && metrics().is_none() {
        tracing::warn!("Prometheus metrics registration failed, /metrics will be empty");
    }

    let api_config = ApiConfig::from_env();
    let upstream_config = UpstreamConfig::from_env();
    tracing::info!(
        telemetry = %upstream_config.telemetry_url,
        catalog = %upstream_config.catalog_url,
        "Upstream configuration loaded"
    );

    // The pool connects lazily, so a database outage only degrades /health
    // and the page endpoints.
    let db = Arc::new(DbClient::from_config(&DbConfig::from_env())?);
    let backends = Backends {
        cms: db.clone(),
        catalog: db.clone(),
        database: db,
    };

    let state = AppState::new(Upstreams::from_config(&upstream_config)?, backends);
    let app: Router = create_api_router(state, &api_config);

    let addr = resolve_bind_addr(&api_config)?;
    tracing::info!(%addr, environment = %telemetry_config.environment, "Starting orbitdeck API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

fn resolve_bind_addr(config: &ApiConfig) -> ApiResult<SocketAddr> {
    let addr = format!("{}:{}", config.bind_host, config.port);
    addr.parse::<SocketAddr>().map_err(|e| {
        ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e))
    })
}
