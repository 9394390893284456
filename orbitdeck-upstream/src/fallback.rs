//! Static datasets served when a provider with a defined fallback is
//! unreachable or unconfigured.
//!
//! Each dataset is written in its provider's raw shape and goes through the
//! same normalizer as live data, so callers cannot tell the shapes apart.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde_json::{json, Map, Value};

/// Five upcoming sky events relative to `now`, in the legacy flat-rows shape.
pub fn astro_events(now: DateTime<Utc>) -> Value {
    let at = |days: i64| (now + Duration::days(days)).format("%Y-%m-%dT%H:%M:00Z").to_string();
    json!({
        "data": {
            "rows": [
                {"body": {"id": "moon", "name": "Moon"}, "events": [
                    {"type": "Full Moon", "date": at(2), "magnitude": "-12.7"}
                ]},
                {"body": {"id": "venus", "name": "Venus"}, "events": [
                    {"type": "Greatest brilliancy", "date": at(5), "magnitude": "-4.6"}
                ]},
                {"body": {"id": "jupiter", "name": "Jupiter"}, "events": [
                    {"type": "Opposition", "date": at(7), "magnitude": "-2.8"}
                ]},
                {"body": {"id": "mars", "name": "Mars"}, "events": [
                    {"type": "Apogee", "time": at(10), "altitude": "45°"}
                ]},
                {"body": {"id": "mercury", "name": "Mercury"}, "events": [
                    {"type": "Greatest eastern elongation", "date": at(12), "note": "Best time for observation"}
                ]}
            ]
        }
    })
}

/// One APOD entry dated `today`.
pub fn apod(today: NaiveDate) -> Value {
    json!([{
        "title": "Orion Nebula in Oxygen, Hydrogen, and Sulfur",
        "date": today.format("%Y-%m-%d").to_string(),
        "explanation": "The Orion Nebula spans about 40 light years and is located about 1500 light years away in the constellation of Orion.",
        "url": "https://apod.nasa.gov/apod/image/2312/OrionNebula_HubbleGendler_4000.jpg",
        "media_type": "image"
    }])
}

/// Two close approaches dated `start`.
pub fn neo_feed(start: NaiveDate) -> Value {
    let date = start.format("%Y-%m-%d").to_string();
    let objects = json!([
        {
            "id": "2021277",
            "name": "21277 (1996 TO5)",
            "absolute_magnitude_h": 16.73,
            "estimated_diameter": {
                "kilometers": {"estimated_diameter_min": 1.6, "estimated_diameter_max": 3.6}
            },
            "is_potentially_hazardous_asteroid": true,
            "close_approach_data": [{
                "close_approach_date": date.clone(),
                "relative_velocity": {"kilometers_per_hour": "54720"},
                "miss_distance": {"kilometers": "19508040"}
            }]
        },
        {
            "id": "3426410",
            "name": "(2008 QV11)",
            "absolute_magnitude_h": 24.3,
            "estimated_diameter": {
                "kilometers": {"estimated_diameter_min": 0.03, "estimated_diameter_max": 0.07}
            },
            "is_potentially_hazardous_asteroid": false,
            "close_approach_data": [{
                "close_approach_date": date.clone(),
                "relative_velocity": {"kilometers_per_hour": "32400"},
                "miss_distance": {"kilometers": "7200000"}
            }]
        }
    ]);
    let mut by_date = Map::new();
    by_date.insert(date, objects);
    json!({ "element_count": 2, "near_earth_objects": by_date })
}

/// Two solar flares.
pub fn solar_flares() -> Value {
    json!([
        {
            "flrID": "2023-12-01T12:34:00-FLR-001",
            "beginTime": "2023-12-01T12:34:00Z",
            "peakTime": "2023-12-01T12:45:00Z",
            "endTime": "2023-12-01T13:00:00Z",
            "classType": "M5.5",
            "sourceLocation": "N15E45",
            "activeRegionNum": 13511
        },
        {
            "flrID": "2023-11-28T08:15:00-FLR-001",
            "beginTime": "2023-11-28T08:15:00Z",
            "peakTime": "2023-11-28T08:30:00Z",
            "endTime": "2023-11-28T09:00:00Z",
            "classType": "X1.2",
            "sourceLocation": "S20W30",
            "activeRegionNum": 13509
        }
    ])
}

/// Two past launches, in the launch-query response shape.
pub fn launches() -> Value {
    json!({
        "docs": [
            {
                "name": "Starlink Group 6-30",
                "date_utc": "2023-12-01T12:00:00.000Z",
                "success": true,
                "details": "Successful deployment of 23 Starlink satellites to low Earth orbit.",
                "links": {
                    "patch": {"small": "https://images2.imgbox.com/starlink-patch.png"},
                    "webcast": "https://www.youtube.com/watch?v=P-xOqMpQ6iw"
                }
            },
            {
                "name": "Crew-7",
                "date_utc": "2023-08-26T07:27:00.000Z",
                "success": true,
                "details": "Crew Dragon spacecraft carrying four astronauts to the ISS.",
                "links": {
                    "patch": {"small": "https://images2.imgbox.com/crew-7-patch.png"},
                    "webcast": "https://www.youtube.com/watch?v=5KeIAYTW8eQ"
                }
            }
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{normalize_events, normalize_launches, normalize_neo};

    #[test]
    fn test_fallback_events_in_insertion_order() {
        let now = Utc::now();
        let events = normalize_events(&astro_events(now));
        let bodies: Vec<&str> = events.iter().map(|e| e.celestial_body.as_str()).collect();
        assert_eq!(bodies, vec!["Moon", "Venus", "Jupiter", "Mars", "Mercury"]);
        assert!(events.iter().all(|e| e.timestamp_utc.is_some()));
        assert_eq!(events[0].extra, "Mag: -12.7");
        assert_eq!(events[3].extra, "Alt: 45°");
        assert_eq!(events[4].extra, "Best time for observation");
    }

    #[test]
    fn test_fallback_neo_uses_start_date() {
        let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap_or_default();
        let out = normalize_neo(&neo_feed(start));
        assert_eq!(out["element_count"], json!(2));
        assert_eq!(
            out["asteroids"][0]["close_approach_data"][0]["close_approach_date"],
            json!("2024-05-01")
        );
    }

    #[test]
    fn test_fallback_launches() {
        let out = normalize_launches(&launches());
        assert_eq!(out["launches"][1]["name"], json!("Crew-7"));
        assert_eq!(solar_flares().as_array().map(Vec::len), Some(2));
        assert_eq!(apod(NaiveDate::default())[0]["media_type"], json!("image"));
    }
}
