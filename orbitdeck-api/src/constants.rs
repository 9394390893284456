//! Constants for the orbitdeck API
//!
//! Cache lifetimes, parameter ranges and configuration defaults in one place.

use std::time::Duration;

// ============================================================================
// CACHE TTLS
// ============================================================================

/// Latest ISS position.
pub const TTL_ISS_LATEST: Duration = Duration::from_secs(30);

/// ISS trend window.
pub const TTL_ISS_TREND: Duration = Duration::from_secs(60);

/// Dataset-catalog listing.
pub const TTL_OSDR_LIST: Duration = Duration::from_secs(60);

/// Telemetry service space-feed cache.
pub const TTL_SPACE_CACHE: Duration = Duration::from_secs(60);

/// Astronomy Picture of the Day (12 hours).
pub const TTL_APOD: Duration = Duration::from_secs(43_200);

/// Near-earth object feed (2 hours).
pub const TTL_NEO: Duration = Duration::from_secs(7_200);

/// DONKI solar flares.
pub const TTL_DONKI: Duration = Duration::from_secs(3_600);

/// SpaceX launches.
pub const TTL_SPACEX: Duration = Duration::from_secs(3_600);

/// Astronomy events and body positions.
pub const TTL_ASTRO: Duration = Duration::from_secs(3_600);

// ============================================================================
// PARAMETER RANGES
// ============================================================================

/// ISS trend window in hours: default, min, max.
pub const TREND_HOURS: (i64, i64, i64) = (24, 1, 168);

/// APOD picture count: default, min, max.
pub const APOD_COUNT: (i64, i64, i64) = (1, 1, 10);

/// SpaceX launch count: default, min, max.
pub const SPACEX_LIMIT: (i64, i64, i64) = (10, 1, 50);

/// Default astronomy window in days.
pub const ASTRO_DAYS_DEFAULT: i64 = 7;

/// DONKI looks this many days back by default.
pub const DONKI_LOOKBACK_DAYS: i64 = 30;

// ============================================================================
// CONFIGURATION DEFAULTS
// ============================================================================

pub const DEFAULT_API_PORT: u16 = 8080;

/// Default CORS max age in seconds (24 hours)
pub const DEFAULT_CORS_MAX_AGE_SECS: u64 = 86400;

pub const DEFAULT_TELEMETRY_URL: &str = "http://rust_iss:3000";

pub const DEFAULT_NASA_API_URL: &str = "https://api.nasa.gov";

/// Public NASA demo key, rate limited per IP.
pub const DEFAULT_NASA_API_KEY: &str = "DEMO_KEY";

pub const DEFAULT_ASTRO_API_URL: &str = "https://api.astronomyapi.com";

pub const DEFAULT_SPACEX_API_URL: &str = "https://api.spacexdata.com";

pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;
