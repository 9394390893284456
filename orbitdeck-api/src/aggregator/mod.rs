//! Aggregator Layer
//!
//! Request orchestration between the response cache and the upstream
//! clients. Every aggregator returns a finished envelope as JSON; handlers
//! only extract parameters and serialize.
//!
//! Feature areas with a fallback dataset (astronomy events, APOD, NEO,
//! DONKI, SpaceX) never report upstream failures to the caller. Passthrough
//! feeds and planet positions answer `ok:false` and are not cached on
//! failure.

mod astro;
mod proxy;
mod space;

pub use astro::AstroAggregator;
pub use proxy::ProxyAggregator;
pub use space::SpaceAggregator;

use orbitdeck_core::{Envelope, UpstreamResult};
use serde_json::Value;

/// `source` value for payloads built from live upstream data.
pub const SOURCE_LIVE: &str = "live";
/// `source` value for payloads built from a fallback dataset.
pub const SOURCE_FALLBACK: &str = "fallback";

/// Turn a passthrough call into the envelope returned to the caller.
///
/// `Ok` values may be cached. `Err` values are final envelopes that must not
/// be cached: upstream failures and upstream bodies that already carry
/// `ok: false`. A body that already is an envelope (an object with a boolean
/// `ok`) is forwarded verbatim; anything else is wrapped as `data`.
pub(crate) fn passthrough(result: UpstreamResult) -> Result<Value, Value> {
    match result.into_result() {
        Ok(payload) => match payload.get("ok").and_then(Value::as_bool) {
            Some(true) => Ok(payload),
            Some(false) => Err(payload),
            None => Ok(Envelope::success(payload).into_value()),
        },
        Err(failure) => Err(Envelope::failure(failure.into()).into_value()),
    }
}

/// Collapse a cache lookup that may carry an uncached envelope.
pub(crate) fn settle(result: Result<Value, Value>) -> Value {
    match result {
        Ok(value) | Err(value) => value,
    }
}
