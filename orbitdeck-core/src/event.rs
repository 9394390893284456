//! Canonical astronomy event record.

use serde::{Deserialize, Serialize};

/// One astronomy event, reshaped from whatever the provider returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EventRecord {
    pub celestial_body: String,
    pub event_type: String,
    pub timestamp_utc: Option<String>,
    /// Short human-readable detail (obscuration, altitude, magnitude, note).
    pub extra: String,
}

impl EventRecord {
    pub fn new(
        celestial_body: impl Into<String>,
        event_type: impl Into<String>,
        timestamp_utc: Option<String>,
        extra: impl Into<String>,
    ) -> Self {
        Self {
            celestial_body: celestial_body.into(),
            event_type: event_type.into(),
            timestamp_utc,
            extra: extra.into(),
        }
    }
}
