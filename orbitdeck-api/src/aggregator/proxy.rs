//! Passthrough feeds from the internal telemetry and catalog services.

use std::sync::Arc;

use orbitdeck_core::{clamp_param, CacheKey, Envelope, EnvelopeError, UpstreamErrorCode};
use orbitdeck_storage::ResponseCache;
use orbitdeck_upstream::{CatalogApi, CatalogQuery, SpaceSource, TelemetryApi};
use serde_json::Value;

use super::{passthrough, settle};
use crate::constants::{TREND_HOURS, TTL_ISS_LATEST, TTL_ISS_TREND, TTL_OSDR_LIST, TTL_SPACE_CACHE};

#[derive(Clone)]
pub struct ProxyAggregator {
    telemetry: TelemetryApi,
    catalog: CatalogApi,
    cache: Arc<ResponseCache>,
}

impl ProxyAggregator {
    pub fn new(telemetry: TelemetryApi, catalog: CatalogApi, cache: Arc<ResponseCache>) -> Self {
        Self {
            telemetry,
            catalog,
            cache,
        }
    }

    /// Latest ISS position and velocity.
    pub async fn iss_latest(&self) -> Value {
        let key = CacheKey::new("iss_latest");
        let result = self
            .cache
            .try_get_or_compute(&key, TTL_ISS_LATEST, || async {
                passthrough(self.telemetry.latest().await)
            })
            .await;
        settle(result)
    }

    /// ISS movement over the last `hours` (clamped to 1..=168).
    pub async fn iss_trend(&self, hours: Option<&str>) -> Value {
        let (default, min, max) = TREND_HOURS;
        let hours = clamp_param(hours, default, min, max);
        let key = CacheKey::new("iss_trend").param("hours", hours);
        let result = self
            .cache
            .try_get_or_compute(&key, TTL_ISS_TREND, || async {
                passthrough(self.telemetry.trend(hours).await)
            })
            .await;
        settle(result)
    }

    pub async fn osdr_list(&self, query: &CatalogQuery) -> Value {
        let key = query.cache_key();
        let result = self
            .cache
            .try_get_or_compute(&key, TTL_OSDR_LIST, || async {
                passthrough(self.catalog.list(query).await)
            })
            .await;
        settle(result)
    }

    /// Cached space feed held by the telemetry service. Unknown sources are
    /// rejected without an upstream call.
    pub async fn space_cache(&self, raw_source: &str) -> Value {
        let Some(source) = SpaceSource::parse(raw_source) else {
            tracing::debug!(source = raw_source, "unsupported space cache source");
            return Envelope::failure(EnvelopeError::new(
                UpstreamErrorCode::InvalidSource,
                format!("Unsupported source '{}'", raw_source),
            ))
            .into_value();
        };

        let key = CacheKey::new("space_cache").param("source", source);
        let result = self
            .cache
            .try_get_or_compute(&key, TTL_SPACE_CACHE, || async {
                passthrough(self.telemetry.space_cache(source).await)
            })
            .await;
        settle(result)
    }
}
