//! Response normalizer: one hand-written mapping per feed.
//!
//! Astronomy payloads come in two historical shapes. Both are decoded into
//! typed variants tried in a fixed order, and both produce the same
//! [`EventRecord`]s. Every other feed is reshaped into a small JSON object
//! with a fixed top-level key. Missing or mistyped fields become empty
//! collections; nothing here fails.

use orbitdeck_core::EventRecord;
use serde::Deserialize;
use serde_json::{json, Map, Value};

/// Which mapping to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    /// AstronomyAPI body events.
    AstroEvents,
    /// NASA Astronomy Picture of the Day.
    Apod,
    /// NASA NeoWs feed.
    NeoFeed,
    /// NASA DONKI solar flares.
    SolarFlares,
    /// SpaceX launch query.
    Launches,
    /// Forward the payload unchanged.
    Passthrough,
}

/// Canonical output of [`normalize`].
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedShape {
    Events(Vec<EventRecord>),
    Json(Value),
}

impl NormalizedShape {
    pub fn into_value(self) -> Value {
        match self {
            NormalizedShape::Events(events) => json!({ "events": events }),
            NormalizedShape::Json(value) => value,
        }
    }
}

pub fn normalize(feed: Feed, raw: &Value) -> NormalizedShape {
    match feed {
        Feed::AstroEvents => NormalizedShape::Events(normalize_events(raw)),
        Feed::Apod => NormalizedShape::Json(normalize_apod(raw)),
        Feed::NeoFeed => NormalizedShape::Json(normalize_neo(raw)),
        Feed::SolarFlares => NormalizedShape::Json(normalize_flares(raw)),
        Feed::Launches => NormalizedShape::Json(normalize_launches(raw)),
        Feed::Passthrough => NormalizedShape::Json(raw.clone()),
    }
}

// ============================================================================
// ASTRONOMY EVENTS
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct BodyRef {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    name: Option<Value>,
}

impl BodyRef {
    fn label(&self) -> String {
        text(self.name.as_ref())
            .or_else(|| text(self.id.as_ref()))
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

/// `{data: {table: {rows: [{entry, cells}]}}}`, the current provider shape.
#[derive(Debug, Deserialize)]
pub struct RowsShapeV1 {
    data: V1Data,
}

#[derive(Debug, Deserialize)]
struct V1Data {
    table: V1Table,
}

#[derive(Debug, Deserialize)]
struct V1Table {
    rows: Vec<V1Row>,
}

#[derive(Debug, Deserialize)]
struct V1Row {
    #[serde(default)]
    entry: BodyRef,
    #[serde(default)]
    cells: Vec<Value>,
}

/// `{data: {rows: [{body, events}]}}`, the legacy flat shape.
#[derive(Debug, Deserialize)]
pub struct RowsShapeV2 {
    data: V2Data,
}

#[derive(Debug, Deserialize)]
struct V2Data {
    rows: Vec<V2Row>,
}

#[derive(Debug, Deserialize)]
struct V2Row {
    #[serde(default)]
    body: BodyRef,
    #[serde(default)]
    events: Vec<Value>,
}

/// Known event payload shapes, in decode priority order.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum EventShape {
    RowsV1(RowsShapeV1),
    RowsV2(RowsShapeV2),
}

impl EventShape {
    pub fn decode(raw: &Value) -> Option<Self> {
        EventShape::deserialize(raw).ok()
    }

    pub fn into_records(self) -> Vec<EventRecord> {
        match self {
            EventShape::RowsV1(shape) => shape
                .data
                .table
                .rows
                .into_iter()
                .flat_map(|row| {
                    let body = row.entry.label();
                    row.cells.into_iter().map(move |cell| event_record(&body, &cell))
                })
                .collect(),
            EventShape::RowsV2(shape) => shape
                .data
                .rows
                .into_iter()
                .flat_map(|row| {
                    let body = row.body.label();
                    row.events.into_iter().map(move |event| event_record(&body, &event))
                })
                .collect(),
        }
    }
}

pub fn normalize_events(raw: &Value) -> Vec<EventRecord> {
    EventShape::decode(raw)
        .map(EventShape::into_records)
        .unwrap_or_default()
}

fn event_record(body: &str, event: &Value) -> EventRecord {
    let peak = event.pointer("/eventHighlights/peak");
    let timestamp = text(event.get("date"))
        .or_else(|| text(event.get("time")))
        .or_else(|| text(peak.and_then(|p| p.get("date"))));
    let event_type = text(event.get("type"))
        .or_else(|| text(event.get("event_type")))
        .unwrap_or_default();

    EventRecord::new(body, event_type, timestamp, event_extra(event))
}

fn event_extra(event: &Value) -> String {
    if let Some(obscuration) = event.pointer("/extraInfo/obscuration").and_then(Value::as_f64) {
        return format!("Obscuration: {}%", (obscuration * 100.0).round() as i64);
    }
    if let Some(altitude) = text(event.get("altitude")) {
        return format!("Alt: {}°", altitude.trim_end_matches('°'));
    }
    if let Some(magnitude) = text(event.get("magnitude")) {
        return format!("Mag: {}", magnitude);
    }
    if let Some(note) = text(event.get("note")) {
        return note;
    }
    event
        .pointer("/eventHighlights/peak/altitude")
        .and_then(Value::as_f64)
        .map(|alt| format!("Peak altitude: {:.1}°", alt))
        .unwrap_or_default()
}

/// Non-empty string or number rendered as text.
fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ============================================================================
// NASA AND SPACEX FEEDS
// ============================================================================

/// APOD returns one object for a date and an array for `count`; both become
/// `{items: [...]}`.
pub fn normalize_apod(raw: &Value) -> Value {
    let items = match raw {
        Value::Array(items) => items.clone(),
        Value::Object(obj) if !obj.is_empty() => vec![raw.clone()],
        _ => Vec::new(),
    };
    json!({ "items": items })
}

/// Flatten the per-date `near_earth_objects` map in date order.
pub fn normalize_neo(raw: &Value) -> Value {
    let mut asteroids = Vec::new();
    if let Some(by_date) = raw.get("near_earth_objects").and_then(Value::as_object) {
        let mut dates: Vec<&String> = by_date.keys().collect();
        dates.sort();
        for date in dates {
            if let Some(objects) = by_date.get(date).and_then(Value::as_array) {
                asteroids.extend(objects.iter().cloned());
            }
        }
    }
    let element_count = raw
        .get("element_count")
        .and_then(Value::as_u64)
        .unwrap_or(asteroids.len() as u64);
    json!({ "element_count": element_count, "asteroids": asteroids })
}

pub fn normalize_flares(raw: &Value) -> Value {
    let events = raw.as_array().cloned().unwrap_or_default();
    json!({ "events": events })
}

pub fn normalize_launches(raw: &Value) -> Value {
    let launches = raw
        .get("docs")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    json!({ "launches": launches })
}

/// Object with the given entries, used by aggregators to add metadata to a
/// normalized payload.
pub fn with_fields(value: Value, fields: impl IntoIterator<Item = (&'static str, Value)>) -> Value {
    let mut obj = match value {
        Value::Object(obj) => obj,
        other => {
            let mut obj = Map::new();
            obj.insert("data".to_string(), other);
            obj
        }
    };
    for (k, v) in fields {
        obj.insert(k.to_string(), v);
    }
    Value::Object(obj)
}
