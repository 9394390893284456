//! orbitdeck API - Space Data Proxy, Cache and Fallback Aggregation
//!
//! Axum server in front of the internal ISS telemetry service and the
//! external NASA, AstronomyAPI and SpaceX APIs. Every proxied response goes
//! through a shared TTL cache; feeds with a static fallback dataset keep
//! answering when their provider is down or unconfigured.
//!
//! CMS pages and dataset-catalog exports are read from PostgreSQL.

mod macros;

pub mod aggregator;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod export;
#[cfg(feature = "openapi")]
pub mod openapi;
pub mod routes;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use aggregator::{AstroAggregator, ProxyAggregator, SpaceAggregator};
pub use config::{ApiConfig, EnvCredentials, UpstreamConfig};
pub use db::{DatabaseHealth, DbClient, DbConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use export::{CsvExport, ExportService};
#[cfg(feature = "openapi")]
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use state::{AppState, Backends, Upstreams};
