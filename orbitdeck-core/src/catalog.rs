//! Dataset-catalog rows and the fixed-schema CSV export.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::ValidationError;

/// Column order of every CSV export. Never reorder: downstream spreadsheets
/// import by position.
pub const CSV_COLUMNS: [&str; 14] = [
    "export_timestamp",
    "updated_at",
    "is_public",
    "has_samples",
    "has_assays",
    "row_number",
    "sample_count",
    "assay_count",
    "dataset_id",
    "title",
    "organism",
    "study_type",
    "status",
    "raw_json",
];

const UTF8_BOM: &str = "\u{FEFF}";

/// One dataset-catalog row, either current or from a prior export snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CatalogRow {
    pub dataset_id: String,
    pub title: String,
    pub organism: String,
    pub study_type: String,
    pub status: String,
    pub updated_at: Option<String>,
    pub is_public: bool,
    pub sample_count: i64,
    pub assay_count: i64,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub raw: Value,
    /// Set for snapshot rows; fresh exports stamp the export time instead.
    pub exported_at: Option<DateTime<Utc>>,
    /// Position recorded when the snapshot was taken. Fresh exports number
    /// rows from 1 instead.
    #[serde(default)]
    pub row_number: Option<i64>,
}

impl CatalogRow {
    /// Build a row from a raw catalog item. Catalog sources disagree on
    /// field names, so each column tries a list of known aliases.
    pub fn from_raw(item: &Value, index: usize) -> Self {
        let text = |keys: &[&str]| {
            first_present(item, keys)
                .map(collapse_whitespace)
                .unwrap_or_default()
        };

        let dataset_id = first_present(item, &["dataset_id", "id", "uuid", "studyId", "accession", "osdr_id"])
            .map(collapse_whitespace)
            .unwrap_or_else(|| format!("unknown_{}", index));

        let updated_at = first_present(item, &["updated", "updated_at", "modified", "lastUpdated", "timestamp"])
            .and_then(to_timestamp);

        Self {
            dataset_id,
            title: text(&["title", "name", "label"]),
            organism: text(&["organism", "species", "model_organism"]),
            study_type: text(&["study_type", "type", "experiment_type"]),
            status: text(&["status", "state", "lifecycle"]),
            updated_at,
            is_public: first_present(item, &["is_public", "public", "isPublic"])
                .map(truthy)
                .unwrap_or(true),
            sample_count: first_present(item, &["samples", "sample_count", "num_samples"])
                .map(count)
                .unwrap_or(0),
            assay_count: first_present(item, &["assays", "assay_count", "num_assays"])
                .map(count)
                .unwrap_or(0),
            raw: item.clone(),
            exported_at: None,
            row_number: None,
        }
    }

    pub fn has_samples(&self) -> bool {
        self.sample_count > 0
    }

    pub fn has_assays(&self) -> bool {
        self.assay_count > 0
    }
}

fn first_present<'a>(item: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| item.get(*k))
        .find(|v| !v.is_null())
}

fn collapse_whitespace(value: &Value) -> String {
    let raw = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Null => false,
    }
}

fn count(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n.as_f64().map(|f| f as i64).unwrap_or(0),
        Value::String(s) => s.trim().parse::<f64>().map(|f| f as i64).unwrap_or(0),
        Value::Array(a) => a.len() as i64,
        _ => 0,
    }
}

fn to_timestamp(value: &Value) -> Option<String> {
    let raw = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => return n.as_i64().and_then(|secs| Utc.timestamp_opt(secs, 0).single()).map(|dt| dt.to_rfc3339()),
        _ => return None,
    };
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return Some(dt.with_timezone(&Utc).to_rfc3339());
    }
    const FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];
    for fmt in FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive).to_rfc3339());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive).to_rfc3339());
    }
    Some(raw)
}

// ============================================================================
// SNAPSHOTS
// ============================================================================

/// Name of a prior export snapshot, e.g. `osdr_export_20240301_120000.csv`.
///
/// Restricted to `[A-Za-z0-9_.-]+` ending in `.csv`, and never `..`-only, so
/// a name can be used as a lookup key or a file name without escaping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SnapshotName(String);

impl SnapshotName {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let charset_ok = raw
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-'));
        let stem = raw.strip_suffix(".csv").unwrap_or_default();
        if charset_ok && !stem.is_empty() && !stem.contains("..") {
            Ok(Self(raw.to_string()))
        } else {
            Err(ValidationError::InvalidSnapshotName {
                name: raw.to_string(),
            })
        }
    }

    /// Snapshot name for an export taken at `at`.
    pub fn for_export(at: DateTime<Utc>) -> Self {
        Self(format!("osdr_export_{}.csv", at.format("%Y%m%d_%H%M%S")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SnapshotName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        SnapshotName::parse(&value)
    }
}

impl From<SnapshotName> for String {
    fn from(name: SnapshotName) -> Self {
        name.0
    }
}

impl fmt::Display for SnapshotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// CSV
// ============================================================================

/// Render rows as a UTF-8 CSV document with BOM, every field quoted and CRLF
/// line endings. An empty slice still yields the BOM and the header row.
pub fn render_csv(rows: &[CatalogRow], exported_at: DateTime<Utc>) -> Vec<u8> {
    let mut out = String::from(UTF8_BOM);
    push_record(&mut out, CSV_COLUMNS.iter().map(|c| c.to_string()));

    for (index, row) in rows.iter().enumerate() {
        let fields = [
            row.exported_at.unwrap_or(exported_at).to_rfc3339(),
            row.updated_at.clone().unwrap_or_default(),
            bool_field(row.is_public),
            bool_field(row.has_samples()),
            bool_field(row.has_assays()),
            row.row_number.unwrap_or(index as i64 + 1).to_string(),
            row.sample_count.to_string(),
            row.assay_count.to_string(),
            row.dataset_id.clone(),
            row.title.clone(),
            row.organism.clone(),
            row.study_type.clone(),
            row.status.clone(),
            serde_json::to_string(&row.raw).unwrap_or_default(),
        ];
        push_record(&mut out, fields.into_iter());
    }

    out.into_bytes()
}

fn bool_field(value: bool) -> String {
    if value { "TRUE" } else { "FALSE" }.to_string()
}

fn push_record(out: &mut String, fields: impl Iterator<Item = String>) {
    let quoted: Vec<String> = fields
        .map(|f| format!("\"{}\"", f.replace('"', "\"\"")))
        .collect();
    out.push_str(&quoted.join(","));
    out.push_str("\r\n");
}
