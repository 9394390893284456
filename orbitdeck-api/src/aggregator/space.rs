//! NASA and SpaceX feeds with static fallbacks.

use std::future::Future;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use orbitdeck_core::{clamp_param, parse_date, CacheKey, Envelope, UpstreamResult};
use orbitdeck_storage::{Clock, ResponseCache};
use orbitdeck_upstream::normalize::{
    normalize_apod, normalize_flares, normalize_launches, normalize_neo, with_fields,
};
use orbitdeck_upstream::{fallback, ApodQuery, NasaApi, SpaceXApi, NEO_MAX_WINDOW_DAYS};
use serde_json::{json, Value};

use super::{SOURCE_FALLBACK, SOURCE_LIVE};
use crate::constants::{
    APOD_COUNT, DONKI_LOOKBACK_DAYS, SPACEX_LIMIT, TTL_APOD, TTL_DONKI, TTL_NEO, TTL_SPACEX,
};
use crate::telemetry::metrics;

#[derive(Clone)]
pub struct SpaceAggregator {
    nasa: NasaApi,
    spacex: SpaceXApi,
    cache: Arc<ResponseCache>,
    clock: Arc<dyn Clock>,
}

impl SpaceAggregator {
    pub fn new(
        nasa: NasaApi,
        spacex: SpaceXApi,
        cache: Arc<ResponseCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            nasa,
            spacex,
            cache,
            clock,
        }
    }

    fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }

    /// Astronomy Picture of the Day. `count > 1` asks for random pictures.
    pub async fn apod(&self, date: Option<&str>, count: Option<&str>) -> Value {
        let today = self.today();
        let date = parse_date(date, today);
        let (default, min, max) = APOD_COUNT;
        let count = clamp_param(count, default, min, max);

        let key = CacheKey::new("space_apod")
            .param("date", date)
            .param("count", count);
        self.cache
            .get_or_compute(&key, TTL_APOD, || {
                live_or_fallback(
                    "apod",
                    self.nasa.apod(ApodQuery::new(date, count)),
                    normalize_apod,
                    move || fallback::apod(today),
                )
            })
            .await
    }

    /// Near-earth objects. The window never exceeds a week after `start`.
    pub async fn neo(&self, start: Option<&str>, end: Option<&str>) -> Value {
        let start = parse_date(start, self.today());
        let latest_end = shift(start, NEO_MAX_WINDOW_DAYS);
        let end = parse_date(end, latest_end).clamp(start, latest_end);

        let key = CacheKey::new("space_neo")
            .param("start", start)
            .param("end", end);
        self.cache
            .get_or_compute(&key, TTL_NEO, || {
                live_or_fallback(
                    "neo",
                    self.nasa.neo_feed(start, end),
                    normalize_neo,
                    move || fallback::neo_feed(start),
                )
            })
            .await
    }

    /// DONKI solar flares, by default over the last 30 days.
    pub async fn donki(&self, start: Option<&str>, end: Option<&str>) -> Value {
        let today = self.today();
        let start = parse_date(start, shift(today, -DONKI_LOOKBACK_DAYS));
        let end = parse_date(end, today).max(start);

        let key = CacheKey::new("space_donki")
            .param("start", start)
            .param("end", end);
        self.cache
            .get_or_compute(&key, TTL_DONKI, || {
                live_or_fallback(
                    "donki",
                    self.nasa.solar_flares(start, end),
                    normalize_flares,
                    fallback::solar_flares,
                )
            })
            .await
    }

    /// Most recent SpaceX launches.
    pub async fn spacex(&self, limit: Option<&str>) -> Value {
        let (default, min, max) = SPACEX_LIMIT;
        let limit = clamp_param(limit, default, min, max);

        let key = CacheKey::new("space_spacex").param("limit", limit);
        self.cache
            .get_or_compute(&key, TTL_SPACEX, || {
                live_or_fallback(
                    "spacex",
                    self.spacex.launches(limit),
                    normalize_launches,
                    fallback::launches,
                )
            })
            .await
    }
}

/// Normalize a live payload, or the fallback dataset when the call failed.
/// The result is always a successful envelope tagged with its `source`.
async fn live_or_fallback<Fut, F>(
    feed: &'static str,
    call: Fut,
    normalize: fn(&Value) -> Value,
    fallback: F,
) -> Value
where
    Fut: Future<Output = UpstreamResult>,
    F: FnOnce() -> Value,
{
    let (source, raw) = match call.await.into_result() {
        Ok(raw) => (SOURCE_LIVE, raw),
        Err(failure) => {
            tracing::info!(feed, code = %failure.code, "serving fallback dataset");
            if let Some(metrics) = metrics() {
                metrics.record_fallback(feed);
            }
            (SOURCE_FALLBACK, fallback())
        }
    };
    let data = with_fields(normalize(&raw), [("source", json!(source))]);
    Envelope::success(data).into_value()
}

fn shift(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(Duration::days(days)).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_saturates_at_calendar_edges() {
        let last = NaiveDate::MAX;
        assert_eq!(shift(last, 7), last);
        let day = NaiveDate::from_ymd_opt(2024, 2, 27).unwrap_or_default();
        assert_eq!(shift(day, 3), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap_or_default());
    }
}
