//! Query parameter normalization and deterministic cache keys.
//!
//! Every caller-supplied number is parsed leniently and clamped into a fixed
//! range, so aggregators never see out-of-range input and two requests that
//! normalize to the same parameters share one cache entry.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Smallest accepted day window.
pub const DAYS_MIN: i64 = 1;
/// Largest accepted day window.
pub const DAYS_MAX: i64 = 365;

/// Keys longer than this are replaced by a digest of the parameter set.
const MAX_RENDERED_KEY_LEN: usize = 160;

/// Parse an integer query value and clamp it into `[min, max]`.
///
/// Decimal input is truncated toward zero, infinities saturate to the nearest
/// bound, and anything unparsable (including NaN and absent values) yields
/// `default` clamped into the same range.
pub fn clamp_param(raw: Option<&str>, default: i64, min: i64, max: i64) -> i64 {
    let parsed = raw.map(str::trim).filter(|s| !s.is_empty()).and_then(|s| {
        s.parse::<i64>().ok().or_else(|| {
            s.parse::<f64>().ok().and_then(|f| {
                if f.is_nan() {
                    None
                } else if f >= max as f64 {
                    Some(max)
                } else if f <= min as f64 {
                    Some(min)
                } else {
                    Some(f.trunc() as i64)
                }
            })
        })
    });
    parsed.unwrap_or(default).clamp(min, max)
}

/// Parse a coordinate, falling back to `default` and clamping to `±limit`.
pub fn parse_coordinate(raw: Option<&str>, default: f64, limit: f64) -> f64 {
    let value = raw
        .map(str::trim)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|f| f.is_finite())
        .unwrap_or(default);
    value.clamp(-limit, limit)
}

/// Parse a `YYYY-MM-DD` date, falling back to `default`.
pub fn parse_date(raw: Option<&str>, default: NaiveDate) -> NaiveDate {
    raw.map(str::trim)
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .unwrap_or(default)
}

/// Observer location used by astronomy endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Moscow, the dashboard's historical default observer.
    pub const DEFAULT: Coordinates = Coordinates {
        latitude: 55.7558,
        longitude: 37.6176,
    };

    pub fn from_query(lat: Option<&str>, lon: Option<&str>) -> Self {
        Self {
            latitude: parse_coordinate(lat, Self::DEFAULT.latitude, 90.0),
            longitude: parse_coordinate(lon, Self::DEFAULT.longitude, 180.0),
        }
    }

    /// Fixed-precision rendering used for cache keys and upstream queries.
    pub fn latitude_str(&self) -> String {
        format!("{:.4}", self.latitude)
    }

    pub fn longitude_str(&self) -> String {
        format!("{:.4}", self.longitude)
    }
}

impl Default for Coordinates {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ============================================================================
// CACHE KEYS
// ============================================================================

/// Deterministic cache key built from an endpoint name and its normalized
/// parameters. Parameter order never matters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    endpoint: String,
    params: BTreeMap<String, String>,
}

impl CacheKey {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Render the key. Long parameter sets (free-text search) collapse to a
    /// SHA-256 digest so keys stay bounded.
    pub fn render(&self) -> String {
        let joined = self
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        if joined.len() <= MAX_RENDERED_KEY_LEN {
            if joined.is_empty() {
                self.endpoint.clone()
            } else {
                format!("{}?{}", self.endpoint, joined)
            }
        } else {
            let digest = Sha256::digest(joined.as_bytes());
            format!("{}#{}", self.endpoint, hex::encode(&digest[..16]))
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_clamp_param_defaults_and_bounds() {
        assert_eq!(clamp_param(None, 7, DAYS_MIN, DAYS_MAX), 7);
        assert_eq!(clamp_param(Some(""), 7, DAYS_MIN, DAYS_MAX), 7);
        assert_eq!(clamp_param(Some("abc"), 7, DAYS_MIN, DAYS_MAX), 7);
        assert_eq!(clamp_param(Some("0"), 7, DAYS_MIN, DAYS_MAX), 1);
        assert_eq!(clamp_param(Some("-40"), 7, DAYS_MIN, DAYS_MAX), 1);
        assert_eq!(clamp_param(Some("9000"), 7, DAYS_MIN, DAYS_MAX), 365);
        assert_eq!(clamp_param(Some("12.9"), 7, DAYS_MIN, DAYS_MAX), 12);
        assert_eq!(clamp_param(Some("1e40"), 7, DAYS_MIN, DAYS_MAX), 365);
        assert_eq!(clamp_param(Some("-inf"), 7, DAYS_MIN, DAYS_MAX), 1);
        assert_eq!(clamp_param(Some("NaN"), 7, DAYS_MIN, DAYS_MAX), 7);
        assert_eq!(
            clamp_param(Some("99999999999999999999999"), 7, DAYS_MIN, DAYS_MAX),
            365
        );
    }

    #[test]
    fn test_coordinates_fallback_and_clamp() {
        let c = Coordinates::from_query(Some("not-a-number"), None);
        assert_eq!(c, Coordinates::DEFAULT);

        let c = Coordinates::from_query(Some("123.0"), Some("-500"));
        assert_eq!(c.latitude, 90.0);
        assert_eq!(c.longitude, -180.0);

        let c = Coordinates::from_query(Some("inf"), Some("12.5"));
        assert_eq!(c.latitude, Coordinates::DEFAULT.latitude);
        assert_eq!(c.longitude_str(), "12.5000");
    }

    #[test]
    fn test_parse_date() {
        let default = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
        assert_eq!(parse_date(Some("2023-12-01"), default).to_string(), "2023-12-01");
        assert_eq!(parse_date(Some("12/01/2023"), default), default);
        assert_eq!(parse_date(None, default), default);
    }

    #[test]
    fn test_cache_key_is_order_independent() {
        let a = CacheKey::new("astro_events").param("lat", "1").param("days", 7);
        let b = CacheKey::new("astro_events").param("days", 7).param("lat", "1");
        assert_eq!(a.render(), b.render());
        assert_eq!(a.render(), "astro_events?days=7&lat=1");
        assert_eq!(CacheKey::new("iss_latest").render(), "iss_latest");
    }

    #[test]
    fn test_cache_key_digests_long_params() {
        let long = "x".repeat(500);
        let key = CacheKey::new("osdr_list").param("search", &long).render();
        assert!(key.starts_with("osdr_list#"));
        assert_eq!(key.len(), "osdr_list#".len() + 32);
        assert_eq!(key, CacheKey::new("osdr_list").param("search", long).render());
    }

    proptest! {
        #[test]
        fn prop_days_always_within_range(raw in any::<String>()) {
            let days = clamp_param(Some(&raw), 7, DAYS_MIN, DAYS_MAX);
            prop_assert!((DAYS_MIN..=DAYS_MAX).contains(&days));
        }

        #[test]
        fn prop_numeric_days_within_range(n in any::<i64>()) {
            let days = clamp_param(Some(&n.to_string()), 7, DAYS_MIN, DAYS_MAX);
            prop_assert!((DAYS_MIN..=DAYS_MAX).contains(&days));
            if (DAYS_MIN..=DAYS_MAX).contains(&n) {
                prop_assert_eq!(days, n);
            }
        }

        #[test]
        fn prop_float_days_within_range(f in any::<f64>()) {
            let days = clamp_param(Some(&f.to_string()), 7, DAYS_MIN, DAYS_MAX);
            prop_assert!((DAYS_MIN..=DAYS_MAX).contains(&days));
        }

        #[test]
        fn prop_coordinates_within_range(lat in any::<f64>(), lon in any::<f64>()) {
            let c = Coordinates::from_query(Some(&lat.to_string()), Some(&lon.to_string()));
            prop_assert!(c.latitude.abs() <= 90.0);
            prop_assert!(c.longitude.abs() <= 180.0);
        }
    }
}
