//! OpenAPI Specification for the orbitdeck API
//!
//! Generated by utoipa from the route annotations and schema derives.

use utoipa::OpenApi;

use orbitdeck_core::{Envelope, EnvelopeError, EventRecord, ProviderId, UpstreamErrorCode};

use crate::error::{ApiError, ErrorCode};
use crate::routes::health::{CacheHealth, ComponentHealth, HealthDetails, HealthResponse, HealthStatus};
use crate::routes::osdr::SnapshotList;
use crate::routes::{astro, health, iss, osdr, page, space};
use crate::telemetry::metrics;

/// OpenAPI document for the orbitdeck API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "orbitdeck API",
        version = "0.1.0",
        description = "Proxy, cache and fallback aggregation for ISS telemetry, NASA, astronomy and SpaceX feeds",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local Development")
    ),
    tags(
        (name = "ISS", description = "Telemetry service passthrough"),
        (name = "OSDR", description = "Dataset catalog listing and CSV export"),
        (name = "Space", description = "NASA and SpaceX feeds"),
        (name = "Astronomy", description = "Sky events and body positions"),
        (name = "CMS", description = "Server-rendered content pages"),
        (name = "Health", description = "Liveness and dependency reachability"),
        (name = "Observability", description = "Prometheus metrics")
    ),
    paths(
        iss::latest,
        iss::trend,
        osdr::list,
        osdr::export,
        osdr::snapshots,
        space::cached_source,
        space::apod,
        space::neo,
        space::donki,
        space::spacex,
        astro::events,
        astro::positions,
        page::show,
        page::index,
        health::health,
        health::ping,
        health::liveness,
        metrics::metrics_handler,
    ),
    components(schemas(
        Envelope,
        EnvelopeError,
        UpstreamErrorCode,
        ProviderId,
        EventRecord,
        ApiError,
        ErrorCode,
        SnapshotList,
        HealthResponse,
        HealthStatus,
        HealthDetails,
        ComponentHealth,
        CacheHealth,
    ))
)]
pub struct ApiDoc;
