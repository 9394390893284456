//! The `{ok, data, error}` envelope returned by every proxy-style endpoint.
//!
//! `ok == true` always carries `data` and never `error`; `ok == false` always
//! carries `error` and never `data`. Fields are private so the only way to
//! build an envelope is through [`Envelope::success`] or [`Envelope::failure`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::upstream::{UpstreamErrorCode, UpstreamFailure};

/// Error half of an envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EnvelopeError {
    pub code: UpstreamErrorCode,
    pub message: String,
    /// HTTP status returned by the upstream, when there was one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_status: Option<u16>,
    /// Correlates the client-visible error with server logs.
    pub trace_id: Uuid,
}

impl EnvelopeError {
    pub fn new(code: UpstreamErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            upstream_status: None,
            trace_id: Uuid::now_v7(),
        }
    }

    pub fn from_code(code: UpstreamErrorCode) -> Self {
        Self::new(code, code.default_message())
    }
}

impl From<&UpstreamFailure> for EnvelopeError {
    fn from(failure: &UpstreamFailure) -> Self {
        Self {
            code: failure.code,
            message: failure.message.clone(),
            upstream_status: failure.status,
            trace_id: Uuid::now_v7(),
        }
    }
}

impl From<UpstreamFailure> for EnvelopeError {
    fn from(failure: UpstreamFailure) -> Self {
        Self::from(&failure)
    }
}

/// Uniform response contract for proxy-style JSON endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Envelope {
    ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<EnvelopeError>,
}

impl Envelope {
    pub fn success(data: Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: EnvelopeError) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&EnvelopeError> {
        self.error.as_ref()
    }

    pub fn into_value(self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl From<Result<Value, UpstreamFailure>> for Envelope {
    fn from(result: Result<Value, UpstreamFailure>) -> Self {
        match result {
            Ok(data) => Envelope::success(data),
            Err(failure) => Envelope::failure(failure.into()),
        }
    }
}
