//! Astronomy events (fan-out with fallback) and body positions (no fallback).

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use futures_util::future::join_all;
use orbitdeck_core::{
    clamp_param, CacheKey, Coordinates, Envelope, EventRecord, ProviderId, UpstreamFailure,
    DAYS_MAX, DAYS_MIN,
};
use orbitdeck_storage::{Clock, ResponseCache};
use orbitdeck_upstream::normalize::normalize_events;
use orbitdeck_upstream::{fallback, AstronomyApi, EVENT_BODIES};
use serde_json::{json, Value};

use super::{settle, SOURCE_FALLBACK, SOURCE_LIVE};
use crate::constants::{ASTRO_DAYS_DEFAULT, TTL_ASTRO};
use crate::telemetry::metrics;

/// Caller parameters after parsing and clamping.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Window {
    at: Coordinates,
    days: i64,
    from: NaiveDate,
    to: NaiveDate,
}

impl Window {
    fn new(lat: Option<&str>, lon: Option<&str>, days: Option<&str>, now: DateTime<Utc>) -> Self {
        let days = clamp_param(days, ASTRO_DAYS_DEFAULT, DAYS_MIN, DAYS_MAX);
        let from = now.date_naive();
        let to = from.checked_add_signed(Duration::days(days)).unwrap_or(from);
        Self {
            at: Coordinates::from_query(lat, lon),
            days,
            from,
            to,
        }
    }

    fn cache_key(&self, endpoint: &str) -> CacheKey {
        CacheKey::new(endpoint)
            .param("lat", self.at.latitude_str())
            .param("lon", self.at.longitude_str())
            .param("days", self.days)
            .param("from", self.from)
    }
}

#[derive(Clone)]
pub struct AstroAggregator {
    astronomy: AstronomyApi,
    cache: Arc<ResponseCache>,
    clock: Arc<dyn Clock>,
}

impl AstroAggregator {
    pub fn new(astronomy: AstronomyApi, cache: Arc<ResponseCache>, clock: Arc<dyn Clock>) -> Self {
        Self {
            astronomy,
            cache,
            clock,
        }
    }

    /// Sky events for the observer over the next `days`.
    ///
    /// Without credentials no call is made and the fallback list is served.
    /// Otherwise every body is queried concurrently; a failed body is skipped
    /// and only a total failure falls back.
    pub async fn events(&self, lat: Option<&str>, lon: Option<&str>, days: Option<&str>) -> Value {
        let now = self.clock.now();
        let window = Window::new(lat, lon, days, now);
        let key = window.cache_key("astro_events");

        self.cache
            .get_or_compute(&key, TTL_ASTRO, || async move {
                let (source, events) = match self.live_events(&window).await {
                    Some(events) => (SOURCE_LIVE, events),
                    None => {
                        if let Some(metrics) = metrics() {
                            metrics.record_fallback("astro_events");
                        }
                        (SOURCE_FALLBACK, normalize_events(&fallback::astro_events(now)))
                    }
                };
                Envelope::success(json!({
                    "source": source,
                    "from": window.from,
                    "to": window.to,
                    "events": events,
                }))
                .into_value()
            })
            .await
    }

    /// `None` when the feature is unconfigured or every body failed.
    async fn live_events(&self, window: &Window) -> Option<Vec<EventRecord>> {
        if !self.astronomy.is_configured() {
            tracing::info!("astronomy credentials not configured, serving fallback events");
            return None;
        }

        let calls = EVENT_BODIES
            .into_iter()
            .map(|body| self.astronomy.events(body, window.at, window.from, window.to));
        let results = join_all(calls).await;

        let mut events = Vec::new();
        let mut any_ok = false;
        for (body, result) in EVENT_BODIES.into_iter().zip(results) {
            match result.into_result() {
                Ok(payload) => {
                    any_ok = true;
                    events.extend(normalize_events(&payload));
                }
                Err(failure) => {
                    tracing::warn!(body, code = %failure.code, "astronomy body failed, skipping");
                }
            }
        }

        if !any_ok {
            tracing::info!("every astronomy body failed, serving fallback events");
            return None;
        }
        Some(events)
    }

    /// Body positions as returned by the provider. There is no fallback, so
    /// failures are reported and never cached.
    pub async fn positions(&self, lat: Option<&str>, lon: Option<&str>, days: Option<&str>) -> Value {
        if !self.astronomy.is_configured() {
            return Envelope::failure(UpstreamFailure::unauthenticated(ProviderId::Astronomy).into())
                .into_value();
        }

        let window = Window::new(lat, lon, days, self.clock.now());
        let key = window.cache_key("astro_positions");
        let result = self
            .cache
            .try_get_or_compute(&key, TTL_ASTRO, || async {
                self.astronomy
                    .positions(window.at, window.from, window.to)
                    .await
                    .into_result()
                    .map(|payload| Envelope::success(payload).into_value())
                    .map_err(|failure| Envelope::failure(failure.into()).into_value())
            })
            .await;
        settle(result)
    }
}
