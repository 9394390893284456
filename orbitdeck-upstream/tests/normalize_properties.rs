//! Body decoding and feed reshaping over arbitrary provider payloads.

use orbitdeck_core::{ProviderId, UpstreamErrorCode};
use orbitdeck_upstream::normalize::{
    normalize_apod, normalize_events, normalize_flares, normalize_launches, normalize_neo,
};
use orbitdeck_upstream::parse_json_body;
use proptest::prelude::*;
use serde_json::{Map, Value};

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9 :._-]{0,12}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec(
                (
                    prop_oneof![
                        Just("data".to_string()),
                        Just("rows".to_string()),
                        Just("docs".to_string()),
                        Just("events".to_string()),
                        Just("near_earth_objects".to_string()),
                        Just("element_count".to_string()),
                        "[a-z_]{1,8}",
                    ],
                    inner,
                ),
                0..6,
            )
            .prop_map(|entries| Value::Object(entries.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn any_body_decodes_or_is_invalid_json(body in ".{0,64}") {
        match parse_json_body(ProviderId::Nasa, &body) {
            Ok(value) => prop_assert!(!value.is_null()),
            Err(failure) => {
                prop_assert_eq!(failure.code, UpstreamErrorCode::InvalidJson);
                prop_assert_eq!(failure.provider, ProviderId::Nasa);
            }
        }
    }

    #[test]
    fn serialized_values_decode_back(value in arb_json()) {
        let body = value.to_string();
        let decoded = parse_json_body(ProviderId::SpaceX, &body);
        if value.is_null() {
            prop_assert!(decoded.is_err());
        } else {
            prop_assert_eq!(decoded.ok(), Some(value));
        }
    }

    #[test]
    fn feed_reshaping_always_yields_lists(raw in arb_json()) {
        prop_assert!(normalize_apod(&raw)["items"].is_array());
        prop_assert!(normalize_flares(&raw)["events"].is_array());
        prop_assert!(normalize_launches(&raw)["launches"].is_array());

        let neo = normalize_neo(&raw);
        prop_assert!(neo["asteroids"].is_array());
        prop_assert!(neo["element_count"].is_u64());

        let _ = normalize_events(&raw);
    }
}
