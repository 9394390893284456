//! API Configuration Module
//!
//! Server, CORS and upstream settings loaded from environment variables with
//! defaults suitable for local development. Database settings live in
//! [`crate::db::DbConfig`].

use std::time::Duration;

use orbitdeck_upstream::{CredentialSource, Credentials};

use crate::constants::{
    DEFAULT_API_PORT, DEFAULT_ASTRO_API_URL, DEFAULT_CORS_MAX_AGE_SECS,
    DEFAULT_NASA_API_KEY, DEFAULT_NASA_API_URL, DEFAULT_SPACEX_API_URL, DEFAULT_TELEMETRY_URL,
    DEFAULT_UPSTREAM_TIMEOUT_SECS,
};

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// Server and CORS configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind host.
    pub bind_host: String,

    /// Bind port.
    pub port: u16,

    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Whether to allow credentials in CORS requests.
    pub cors_allow_credentials: bool,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: DEFAULT_API_PORT,
            cors_origins: Vec::new(),
            cors_allow_credentials: false,
            cors_max_age_secs: DEFAULT_CORS_MAX_AGE_SECS,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `ORBITDECK_API_BIND`: Bind host (default: 0.0.0.0)
    /// - `PORT` / `ORBITDECK_API_PORT`: Bind port (default: 8080)
    /// - `ORBITDECK_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `ORBITDECK_CORS_ALLOW_CREDENTIALS`: "true" or "false" (default: false)
    /// - `ORBITDECK_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    pub fn from_env() -> Self {
        let cors_origins = std::env::var("ORBITDECK_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let port = std::env::var("PORT")
            .ok()
            .or_else(|| std::env::var("ORBITDECK_API_PORT").ok())
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_API_PORT);

        Self {
            bind_host: std::env::var("ORBITDECK_API_BIND").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            cors_origins,
            cors_allow_credentials: std::env::var("ORBITDECK_CORS_ALLOW_CREDENTIALS")
                .ok()
                .map(|s| s.to_lowercase() == "true")
                .unwrap_or(false),
            cors_max_age_secs: std::env::var("ORBITDECK_CORS_MAX_AGE_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_CORS_MAX_AGE_SECS),
        }
    }

    /// Check if running in production mode (strict CORS).
    pub fn is_production(&self) -> bool {
        !self.cors_origins.is_empty()
    }
}

// ============================================================================
// UPSTREAM CONFIGURATION
// ============================================================================

/// Base URLs and timeouts for every upstream provider.
///
/// Credentials are not stored here: they are read from the environment on
/// every call through [`EnvCredentials`].
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub telemetry_url: String,
    pub catalog_url: String,
    pub nasa_url: String,
    pub astro_url: String,
    pub spacex_url: String,
    /// Per-call timeout for external providers.
    pub upstream_timeout: Duration,
    /// Per-call timeout for the internal telemetry service.
    pub telemetry_timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            telemetry_url: DEFAULT_TELEMETRY_URL.to_string(),
            catalog_url: DEFAULT_TELEMETRY_URL.to_string(),
            nasa_url: DEFAULT_NASA_API_URL.to_string(),
            astro_url: DEFAULT_ASTRO_API_URL.to_string(),
            spacex_url: DEFAULT_SPACEX_API_URL.to_string(),
            upstream_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
            telemetry_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        }
    }
}

impl UpstreamConfig {
    /// Create UpstreamConfig from environment variables.
    ///
    /// Environment variables:
    /// - `RUST_BASE` / `ORBITDECK_TELEMETRY_URL`: Telemetry service (default: http://rust_iss:3000)
    /// - `ORBITDECK_CATALOG_URL`: Dataset catalog (default: telemetry URL)
    /// - `NASA_API_URL`, `ASTRO_API_URL`, `SPACEX_API_URL`: External provider bases
    /// - `ORBITDECK_UPSTREAM_TIMEOUT_SECS`: External call timeout (default: 10)
    /// - `ORBITDECK_TELEMETRY_TIMEOUT_SECS`: Telemetry call timeout (default: 10)
    pub fn from_env() -> Self {
        let telemetry_url = non_empty_var("RUST_BASE")
            .or_else(|| non_empty_var("ORBITDECK_TELEMETRY_URL"))
            .unwrap_or_else(|| DEFAULT_TELEMETRY_URL.to_string());
        let secs = |name: &str| {
            std::env::var(name)
                .ok()
                .and_then(|s| s.trim().parse::<u64>().ok())
                .filter(|s| *s > 0)
                .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS)
        };

        Self {
            catalog_url: non_empty_var("ORBITDECK_CATALOG_URL").unwrap_or_else(|| telemetry_url.clone()),
            telemetry_url,
            nasa_url: non_empty_var("NASA_API_URL").unwrap_or_else(|| DEFAULT_NASA_API_URL.to_string()),
            astro_url: non_empty_var("ASTRO_API_URL").unwrap_or_else(|| DEFAULT_ASTRO_API_URL.to_string()),
            spacex_url: non_empty_var("SPACEX_API_URL")
                .unwrap_or_else(|| DEFAULT_SPACEX_API_URL.to_string()),
            upstream_timeout: Duration::from_secs(secs("ORBITDECK_UPSTREAM_TIMEOUT_SECS")),
            telemetry_timeout: Duration::from_secs(secs("ORBITDECK_TELEMETRY_TIMEOUT_SECS")),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

// ============================================================================
// CREDENTIALS
// ============================================================================

/// Provider credentials read from the process environment at call time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvCredentials {
    /// `NASA_API_KEY` as the `api_key` query parameter, `DEMO_KEY` when unset.
    NasaApiKey,
    /// `ASTRO_APP_ID` / `ASTRO_APP_SECRET` as basic auth. Missing unless both
    /// are set.
    AstronomyBasic,
}

impl CredentialSource for EnvCredentials {
    fn resolve(&self) -> Credentials {
        match self {
            EnvCredentials::NasaApiKey => Credentials::api_key(
                "api_key",
                non_empty_var("NASA_API_KEY").unwrap_or_else(|| DEFAULT_NASA_API_KEY.to_string()),
            ),
            EnvCredentials::AstronomyBasic => Credentials::basic_from_parts(
                non_empty_var("ASTRO_APP_ID"),
                non_empty_var("ASTRO_APP_SECRET"),
            ),
        }
    }
}
