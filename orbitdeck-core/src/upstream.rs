//! Upstream provider identity and per-call results.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

// ============================================================================
// PROVIDER IDENTITY
// ============================================================================

/// Every HTTP service orbitdeck reads data from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    /// Internal ISS telemetry service.
    Telemetry,
    /// Dataset-catalog (OSDR) service.
    Catalog,
    /// AstronomyAPI events and positions.
    Astronomy,
    /// NASA open APIs (APOD, NeoWs, DONKI).
    Nasa,
    /// SpaceX launch API.
    SpaceX,
}

impl ProviderId {
    pub const ALL: [ProviderId; 5] = [
        ProviderId::Telemetry,
        ProviderId::Catalog,
        ProviderId::Astronomy,
        ProviderId::Nasa,
        ProviderId::SpaceX,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Telemetry => "telemetry",
            ProviderId::Catalog => "catalog",
            ProviderId::Astronomy => "astronomy",
            ProviderId::Nasa => "nasa",
            ProviderId::SpaceX => "spacex",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ERROR TAXONOMY
// ============================================================================

/// Error codes carried in `ok:false` envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpstreamErrorCode {
    /// The call did not complete within its timeout.
    Timeout,
    /// Network failure or non-2xx status.
    UpstreamError,
    /// The body was empty or not valid JSON.
    InvalidJson,
    /// Required credentials are not configured.
    Unauthenticated,
    /// The caller asked for a provider source that is not supported.
    InvalidSource,
    /// Lookup found nothing.
    NotFound,
}

impl UpstreamErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpstreamErrorCode::Timeout => "TIMEOUT",
            UpstreamErrorCode::UpstreamError => "UPSTREAM_ERROR",
            UpstreamErrorCode::InvalidJson => "INVALID_JSON",
            UpstreamErrorCode::Unauthenticated => "UNAUTHENTICATED",
            UpstreamErrorCode::InvalidSource => "INVALID_SOURCE",
            UpstreamErrorCode::NotFound => "NOT_FOUND",
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            UpstreamErrorCode::Timeout => "Upstream did not respond in time",
            UpstreamErrorCode::UpstreamError => "Upstream request failed",
            UpstreamErrorCode::InvalidJson => "Invalid JSON response",
            UpstreamErrorCode::Unauthenticated => "Credentials are not configured",
            UpstreamErrorCode::InvalidSource => "Unknown source",
            UpstreamErrorCode::NotFound => "Not found",
        }
    }
}

impl fmt::Display for UpstreamErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// CALL RESULTS
// ============================================================================

/// Why a single upstream call failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{provider} call failed with {code}: {message}")]
pub struct UpstreamFailure {
    pub provider: ProviderId,
    pub code: UpstreamErrorCode,
    /// HTTP status, when the upstream answered at all.
    pub status: Option<u16>,
    pub message: String,
}

impl UpstreamFailure {
    pub fn new(provider: ProviderId, code: UpstreamErrorCode, message: impl Into<String>) -> Self {
        Self {
            provider,
            code,
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn timeout(provider: ProviderId) -> Self {
        Self::new(
            provider,
            UpstreamErrorCode::Timeout,
            UpstreamErrorCode::Timeout.default_message(),
        )
    }

    pub fn unauthenticated(provider: ProviderId) -> Self {
        Self::new(
            provider,
            UpstreamErrorCode::Unauthenticated,
            format!("No credentials configured for {}", provider),
        )
    }
}

/// Outcome of one upstream call. Created per call, consumed immediately by
/// the normalizer, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResult {
    pub provider: ProviderId,
    pub outcome: Result<Value, UpstreamFailure>,
}

impl UpstreamResult {
    pub fn ok(provider: ProviderId, payload: Value) -> Self {
        Self {
            provider,
            outcome: Ok(payload),
        }
    }

    pub fn failed(failure: UpstreamFailure) -> Self {
        Self {
            provider: failure.provider,
            outcome: Err(failure),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn payload(&self) -> Option<&Value> {
        self.outcome.as_ref().ok()
    }

    pub fn error_code(&self) -> Option<UpstreamErrorCode> {
        self.outcome.as_ref().err().map(|f| f.code)
    }

    pub fn into_result(self) -> Result<Value, UpstreamFailure> {
        self.outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_code_serialization() -> Result<(), serde_json::Error> {
        let json = serde_json::to_string(&UpstreamErrorCode::InvalidJson)?;
        assert_eq!(json, "\"INVALID_JSON\"");
        let back: UpstreamErrorCode = serde_json::from_str("\"UNAUTHENTICATED\"")?;
        assert_eq!(back, UpstreamErrorCode::Unauthenticated);
        Ok(())
    }

    #[test]
    fn test_display_matches_wire_name() {
        for code in [
            UpstreamErrorCode::Timeout,
            UpstreamErrorCode::UpstreamError,
            UpstreamErrorCode::InvalidSource,
            UpstreamErrorCode::NotFound,
        ] {
            let wire = serde_json::to_value(code).unwrap_or_default();
            assert_eq!(wire, json!(code.to_string()));
        }
    }

    #[test]
    fn test_result_accessors() {
        let ok = UpstreamResult::ok(ProviderId::Nasa, json!({"title": "x"}));
        assert!(ok.is_success());
        assert_eq!(ok.error_code(), None);

        let failed = UpstreamResult::failed(
            UpstreamFailure::new(ProviderId::SpaceX, UpstreamErrorCode::UpstreamError, "boom")
                .with_status(502),
        );
        assert!(!failed.is_success());
        assert_eq!(failed.provider, ProviderId::SpaceX);
        assert_eq!(failed.error_code(), Some(UpstreamErrorCode::UpstreamError));
        assert!(failed.payload().is_none());
    }
}
