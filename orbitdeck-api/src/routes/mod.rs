//! REST API Routes Module
//!
//! Route handlers per feature area, assembled by [`create_api_router`].
//!
//! Middleware stack (outermost first):
//! 1. CORS layer
//! 2. HTTP trace layer
//! 3. Observability (span + Prometheus metrics)

pub mod astro;
pub mod health;
pub mod iss;
pub mod osdr;
pub mod page;
pub mod space;

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    response::Redirect,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};

#[cfg(feature = "openapi")]
use crate::openapi::ApiDoc;
#[cfg(feature = "openapi")]
use axum::{response::IntoResponse, Json};
#[cfg(feature = "openapi")]
use utoipa::OpenApi;

/// Handler for /openapi.json endpoint.
#[cfg(feature = "openapi")]
async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

/// Dashboards are not served here; the root points at the health report.
async fn root() -> Redirect {
    Redirect::temporary("/health")
}

/// Create the complete API router.
///
/// `/api/*` answers with envelopes (always HTTP 200); `/page/*`, the CSV
/// export and `/health` use regular status codes.
pub fn create_api_router(state: AppState, api_config: &ApiConfig) -> Router {
    let api_routes = Router::new()
        .nest("/iss", iss::create_router())
        .nest("/osdr", osdr::create_router())
        .nest("/space", space::create_router())
        .nest("/astro", astro::create_router());

    let router = Router::new()
        .nest("/api", api_routes)
        .nest("/page", page::create_router())
        .nest("/health", health::create_router())
        .route("/", get(root))
        .route("/metrics", get(metrics_handler))
        .with_state(state);

    #[cfg(feature = "openapi")]
    let router = router.route("/openapi.json", get(openapi_json));

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(from_fn(observability_middleware)),
        )
        .layer(build_cors_layer(api_config))
}

/// Build the CORS layer from ApiConfig.
///
/// Only read methods are exposed. An empty origin list allows any origin.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_DISPOSITION])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any)
    } else {
        tracing::info!(
            "CORS: Production mode - allowing origins: {:?}",
            config.cors_origins
        );
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        if config.cors_allow_credentials {
            cors.allow_origin(origins).allow_credentials(true)
        } else {
            cors.allow_origin(origins)
        }
    }
}
