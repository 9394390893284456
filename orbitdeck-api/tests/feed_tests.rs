//! Envelope, fallback and caching behavior of the JSON feeds.

mod support;

use axum::http::StatusCode;
use chrono::Duration;
use orbitdeck_core::UpstreamErrorCode;
use orbitdeck_test_utils::assertions::{assert_error_code, assert_ok_envelope, assert_source};
use orbitdeck_test_utils::fixtures;
use serde_json::json;
use support::{Harness, Stubs};

const SUN_EVENTS: &str = "/api/v2/bodies/events/sun";
const MOON_EVENTS: &str = "/api/v2/bodies/events/moon";

fn bodies(data: &serde_json::Value) -> Vec<String> {
    data["events"]
        .as_array()
        .map(|events| {
            events
                .iter()
                .filter_map(|e| e["celestial_body"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

// ============================================================================
// ASTRONOMY EVENTS
// ============================================================================

#[tokio::test]
async fn astro_events_without_credentials_serve_fallback() -> Result<(), String> {
    let mut stubs = Stubs::default();
    stubs.astronomy = stubs.astronomy.unconfigured();
    let h = Harness::new(stubs);

    let (status, body) = h.get_json("/api/astro/events?lat=55.75&lon=37.62&days=7").await?;
    assert_eq!(status, StatusCode::OK);
    assert_source(&body, "fallback");
    let data = assert_ok_envelope(&body);
    assert_eq!(bodies(data), ["Moon", "Venus", "Jupiter", "Mars", "Mercury"]);
    assert_eq!(data["from"], "2024-03-01");
    assert_eq!(data["to"], "2024-03-08");
    assert_eq!(h.astronomy.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn astro_events_merge_both_shapes_in_body_order() -> Result<(), String> {
    let mut stubs = Stubs::default();
    stubs.astronomy = stubs
        .astronomy
        .respond(SUN_EVENTS, fixtures::sun_events_v1())
        .respond(MOON_EVENTS, fixtures::moon_events_v2());
    let h = Harness::new(stubs);

    let (_, body) = h.get_json("/api/astro/events").await?;
    assert_source(&body, "live");
    let data = assert_ok_envelope(&body);
    assert_eq!(bodies(data), ["Sun", "Moon"]);
    assert_eq!(data["events"][0]["extra"], "Obscuration: 100%");
    assert_eq!(data["events"][1]["timestamp_utc"], "2024-03-25T07:00:00Z");
    Ok(())
}

#[tokio::test]
async fn astro_events_skip_a_failed_body() -> Result<(), String> {
    let mut stubs = Stubs::default();
    stubs.astronomy = stubs
        .astronomy
        .fail(SUN_EVENTS, UpstreamErrorCode::Timeout)
        .respond(MOON_EVENTS, fixtures::moon_events_v2());
    let h = Harness::new(stubs);

    let (_, body) = h.get_json("/api/astro/events").await?;
    assert_source(&body, "live");
    assert_eq!(bodies(assert_ok_envelope(&body)), ["Moon"]);
    assert_eq!(h.astronomy.call_count(), 2);
    Ok(())
}

#[tokio::test]
async fn astro_events_fall_back_when_every_body_fails() -> Result<(), String> {
    let h = Harness::new(Stubs::default());

    let (status, body) = h.get_json("/api/astro/events").await?;
    assert_eq!(status, StatusCode::OK);
    assert_source(&body, "fallback");
    assert_eq!(bodies(assert_ok_envelope(&body)).len(), 5);
    Ok(())
}

#[tokio::test]
async fn astro_events_are_cached_until_ttl_expires() -> Result<(), String> {
    let mut stubs = Stubs::default();
    stubs.astronomy = stubs
        .astronomy
        .respond(SUN_EVENTS, fixtures::sun_events_v1())
        .respond(MOON_EVENTS, fixtures::moon_events_v2());
    let h = Harness::new(stubs);

    let (_, first) = h.get_json("/api/astro/events?days=7").await?;
    let (_, second) = h.get_json("/api/astro/events?days=7.9").await?;
    assert_eq!(first, second);
    assert_eq!(h.astronomy.call_count(), 2);

    h.clock.advance(Duration::minutes(61));
    h.get_json("/api/astro/events?days=7").await?;
    assert_eq!(h.astronomy.call_count(), 4);
    Ok(())
}

#[tokio::test]
async fn astro_positions_without_credentials_are_unauthenticated() -> Result<(), String> {
    let mut stubs = Stubs::default();
    stubs.astronomy = stubs.astronomy.unconfigured();
    let h = Harness::new(stubs);

    let (status, body) = h.get_json("/api/astro/positions").await?;
    assert_eq!(status, StatusCode::OK);
    assert_error_code(&body, "UNAUTHENTICATED");
    assert_eq!(h.astronomy.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn astro_positions_failures_are_not_cached() -> Result<(), String> {
    let h = Harness::new(Stubs::default());

    let (_, body) = h.get_json("/api/astro/positions").await?;
    assert_error_code(&body, "UPSTREAM_ERROR");
    h.get_json("/api/astro/positions").await?;
    assert_eq!(h.astronomy.calls_to("/api/v2/bodies/positions"), 2);
    Ok(())
}

// ============================================================================
// PASSTHROUGH FEEDS
// ============================================================================

#[tokio::test]
async fn iss_latest_forwards_envelope_and_caches_it() -> Result<(), String> {
    let mut stubs = Stubs::default();
    stubs.telemetry = stubs.telemetry.respond("/api/iss/latest", fixtures::iss_latest());
    let h = Harness::new(stubs);

    let (status, body) = h.get_json("/api/iss/latest").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, fixtures::iss_latest());

    h.get_json("/api/iss/last").await?;
    assert_eq!(h.telemetry.call_count(), 1);
    Ok(())
}

#[tokio::test]
async fn iss_failure_is_an_error_envelope_with_status_200() -> Result<(), String> {
    let mut stubs = Stubs::default();
    stubs.telemetry = stubs.telemetry.fail("/api/iss/latest", UpstreamErrorCode::Timeout);
    let h = Harness::new(stubs);

    let (status, body) = h.get_json("/api/iss/latest").await?;
    assert_eq!(status, StatusCode::OK);
    assert_error_code(&body, "TIMEOUT");

    h.get_json("/api/iss/latest").await?;
    assert_eq!(h.telemetry.call_count(), 2);
    Ok(())
}

#[tokio::test]
async fn iss_trend_clamps_hours() -> Result<(), String> {
    let mut stubs = Stubs::default();
    stubs.telemetry = stubs
        .telemetry
        .respond("/api/iss/trend", serde_json::json!({"points": []}));
    let h = Harness::new(stubs);

    let (_, body) = h.get_json("/api/iss/trend?hours=9999").await?;
    assert_ok_envelope(&body);
    let requests = h.telemetry.requests();
    assert_eq!(requests[0].query_value("hours"), Some("168"));
    Ok(())
}

#[tokio::test]
async fn osdr_list_wraps_bare_payload() -> Result<(), String> {
    let mut stubs = Stubs::default();
    stubs.catalog = stubs.catalog.respond("/api/osdr", fixtures::catalog_page());
    let h = Harness::new(stubs);

    let (_, body) = h.get_json("/api/osdr?limit=500").await?;
    let data = assert_ok_envelope(&body);
    assert_eq!(data, &fixtures::catalog_page());
    assert_eq!(h.catalog.requests()[0].query_value("limit"), Some("100"));
    Ok(())
}

#[tokio::test]
async fn space_cache_rejects_unknown_source_without_a_call() -> Result<(), String> {
    let h = Harness::new(Stubs::default());

    let (status, body) = h.get_json("/api/space/cache/xyz").await?;
    assert_eq!(status, StatusCode::OK);
    assert_error_code(&body, "INVALID_SOURCE");
    assert!(body["error"]["message"]
        .as_str()
        .is_some_and(|m| m.contains("xyz")));
    assert_eq!(h.telemetry.call_count(), 0);
    Ok(())
}

// ============================================================================
// NASA AND SPACEX
// ============================================================================

#[tokio::test]
async fn spacex_failure_serves_fallback_launches() -> Result<(), String> {
    let h = Harness::new(Stubs::default());

    let (status, body) = h.get_json("/api/space/spacex?limit=3").await?;
    assert_eq!(status, StatusCode::OK);
    assert_source(&body, "fallback");
    assert!(assert_ok_envelope(&body)["launches"]
        .as_array()
        .is_some_and(|l| !l.is_empty()));
    Ok(())
}

#[tokio::test]
async fn spacex_live_launches_are_normalized() -> Result<(), String> {
    let mut stubs = Stubs::default();
    stubs.spacex = stubs.spacex.respond("/v5/launches/query", fixtures::launches());
    let h = Harness::new(stubs);

    let (_, body) = h.get_json("/api/space/spacex").await?;
    assert_source(&body, "live");
    assert_eq!(assert_ok_envelope(&body)["launches"][1]["name"], "Crew-8");
    Ok(())
}

#[tokio::test]
async fn apod_single_object_becomes_item_list() -> Result<(), String> {
    let mut stubs = Stubs::default();
    stubs.nasa = stubs.nasa.respond("/planetary/apod", fixtures::apod_single());
    let h = Harness::new(stubs);

    let (_, body) = h.get_json("/api/space/apod").await?;
    assert_source(&body, "live");
    let items = &assert_ok_envelope(&body)["items"];
    assert_eq!(items.as_array().map(Vec::len), Some(1));
    assert_eq!(items[0]["title"], "Pillars of Creation");
    Ok(())
}

#[tokio::test]
async fn neo_window_is_capped_at_a_week() -> Result<(), String> {
    let h = Harness::new(Stubs::default());

    let (_, body) = h
        .get_json("/api/space/neo?start_date=2024-03-01&end_date=2024-04-30")
        .await?;
    assert_source(&body, "fallback");
    let requests = h.nasa.requests();
    assert_eq!(requests[0].query_value("start_date"), Some("2024-03-01"));
    assert_eq!(requests[0].query_value("end_date"), Some("2024-03-08"));
    Ok(())
}

#[tokio::test]
async fn neo_failure_serves_fallback_dated_at_start() -> Result<(), String> {
    let h = Harness::new(Stubs::default());

    let (status, body) = h.get_json("/api/space/neo?start_date=2024-03-04").await?;
    assert_eq!(status, StatusCode::OK);
    assert_source(&body, "fallback");
    let data = assert_ok_envelope(&body);
    assert_eq!(data["element_count"], 2);
    let asteroids = data["asteroids"].as_array().ok_or("asteroids missing")?;
    assert_eq!(asteroids.len(), 2);
    assert_eq!(asteroids[0]["name"], "21277 (1996 TO5)");
    for asteroid in asteroids {
        assert_eq!(
            asteroid["close_approach_data"][0]["close_approach_date"],
            "2024-03-04"
        );
    }
    Ok(())
}

#[tokio::test]
async fn apod_failure_serves_fallback_for_today() -> Result<(), String> {
    let h = Harness::new(Stubs::default());

    let (_, body) = h.get_json("/api/space/apod").await?;
    assert_source(&body, "fallback");
    let items = &assert_ok_envelope(&body)["items"];
    assert_eq!(items.as_array().map(Vec::len), Some(1));
    assert!(items[0]["title"].as_str().is_some_and(|t| t.starts_with("Orion Nebula")));
    assert_eq!(items[0]["date"], "2024-03-01");
    assert_eq!(h.nasa.calls_to("/planetary/apod"), 1);
    Ok(())
}

#[tokio::test]
async fn donki_failure_serves_fallback_flares() -> Result<(), String> {
    let h = Harness::new(Stubs::default());

    let (status, body) = h.get_json("/api/space/donki").await?;
    assert_eq!(status, StatusCode::OK);
    assert_source(&body, "fallback");
    let classes: Vec<&str> = assert_ok_envelope(&body)["events"]
        .as_array()
        .ok_or("events missing")?
        .iter()
        .filter_map(|e| e["classType"].as_str())
        .collect();
    assert_eq!(classes, vec!["M5.5", "X1.2"]);

    let requests = h.nasa.requests();
    assert_eq!(requests[0].path, "/DONKI/FLR");
    assert_eq!(requests[0].query_value("startDate"), Some("2024-01-31"));
    assert_eq!(requests[0].query_value("endDate"), Some("2024-03-01"));

    // Fallbacks are cached like live data.
    h.get_json("/api/space/donki").await?;
    assert_eq!(h.nasa.calls_to("/DONKI/FLR"), 1);
    Ok(())
}

#[tokio::test]
async fn donki_live_flares_are_wrapped_as_events() -> Result<(), String> {
    let mut stubs = Stubs::default();
    stubs.nasa = stubs.nasa.respond(
        "/DONKI/FLR",
        json!([{"flrID": "2024-02-22T22:08:00-FLR-001", "classType": "X6.3"}]),
    );
    let h = Harness::new(stubs);

    let (_, body) = h
        .get_json("/api/space/donki?start_date=2024-02-20&end_date=2024-02-25")
        .await?;
    assert_source(&body, "live");
    let events = &assert_ok_envelope(&body)["events"];
    assert_eq!(events.as_array().map(Vec::len), Some(1));
    assert_eq!(events[0]["classType"], "X6.3");
    let requests = h.nasa.requests();
    assert_eq!(requests[0].query_value("startDate"), Some("2024-02-20"));
    assert_eq!(requests[0].query_value("endDate"), Some("2024-02-25"));
    Ok(())
}
