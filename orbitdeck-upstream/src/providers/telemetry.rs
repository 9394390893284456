//! Internal ISS telemetry service.

use std::fmt;
use std::sync::Arc;

use orbitdeck_core::UpstreamResult;

use crate::client::UpstreamClient;
use crate::request::UpstreamRequest;

/// Cached space feeds the telemetry service exposes under
/// `/api/space/cache/{source}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpaceSource {
    Apod,
    Neo,
    Flr,
    Cme,
    SpaceX,
}

impl SpaceSource {
    pub const ALL: [SpaceSource; 5] = [
        SpaceSource::Apod,
        SpaceSource::Neo,
        SpaceSource::Flr,
        SpaceSource::Cme,
        SpaceSource::SpaceX,
    ];

    /// Exact, case-sensitive match against the supported names.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == raw)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SpaceSource::Apod => "apod",
            SpaceSource::Neo => "neo",
            SpaceSource::Flr => "flr",
            SpaceSource::Cme => "cme",
            SpaceSource::SpaceX => "spacex",
        }
    }
}

impl fmt::Display for SpaceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone)]
pub struct TelemetryApi {
    client: Arc<dyn UpstreamClient>,
}

impl TelemetryApi {
    pub fn new(client: Arc<dyn UpstreamClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<dyn UpstreamClient> {
        &self.client
    }

    pub async fn latest(&self) -> UpstreamResult {
        self.client.call(UpstreamRequest::get("/api/iss/latest")).await
    }

    pub async fn trend(&self, hours: i64) -> UpstreamResult {
        self.client
            .call(UpstreamRequest::get("/api/iss/trend").query("hours", hours))
            .await
    }

    pub async fn space_cache(&self, source: SpaceSource) -> UpstreamResult {
        self.client
            .call(UpstreamRequest::get(format!("/api/space/cache/{}", source)))
            .await
    }
}
