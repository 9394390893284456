//! Orbitdeck Upstream - Provider Clients and Response Normalization
//!
//! Typed HTTP clients for every data provider orbitdeck reads from, the
//! normalizer that reshapes their payloads, and the static fallback datasets
//! served when a provider is down or unconfigured.
//!
//! Clients never return `Err`: every failure is folded into an
//! [`UpstreamResult`](orbitdeck_core::UpstreamResult) with an error code.

pub mod client;
pub mod credentials;
pub mod fallback;
pub mod normalize;
pub mod providers;
pub mod request;
pub mod retry;

pub use client::{parse_json_body, HttpUpstream, Probe, UpstreamClient, DEFAULT_TIMEOUT, PROBE_TIMEOUT};
pub use credentials::{CredentialSource, Credentials};
pub use normalize::{normalize, EventShape, Feed, NormalizedShape};
pub use providers::{
    ApodQuery, AstronomyApi, CatalogApi, CatalogQuery, NasaApi, SpaceSource, SpaceXApi,
    TelemetryApi, EVENT_BODIES, NEO_MAX_WINDOW_DAYS,
};
pub use request::{HttpMethod, UpstreamRequest};
pub use retry::RetryPolicy;
