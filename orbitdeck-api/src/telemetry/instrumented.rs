//! Metric recording for upstream calls and cache lookups.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use orbitdeck_core::{ProviderId, UpstreamResult};
use orbitdeck_storage::CacheObserver;
use orbitdeck_upstream::{Probe, UpstreamClient, UpstreamRequest};

use super::metrics::metrics;

/// [`UpstreamClient`] decorator that counts every call by provider and
/// outcome and records its latency.
pub struct InstrumentedUpstream {
    inner: Arc<dyn UpstreamClient>,
}

impl InstrumentedUpstream {
    pub fn new(inner: Arc<dyn UpstreamClient>) -> Self {
        Self { inner }
    }

    /// Wrap `inner` and return it as a trait object.
    pub fn wrap(inner: Arc<dyn UpstreamClient>) -> Arc<dyn UpstreamClient> {
        Arc::new(Self::new(inner))
    }
}

#[async_trait]
impl UpstreamClient for InstrumentedUpstream {
    fn provider(&self) -> ProviderId {
        self.inner.provider()
    }

    fn is_configured(&self) -> bool {
        self.inner.is_configured()
    }

    async fn call(&self, request: UpstreamRequest) -> UpstreamResult {
        let start = Instant::now();
        let result = self.inner.call(request).await;
        if let Some(metrics) = metrics() {
            let outcome = match result.error_code() {
                None => "ok".to_string(),
                Some(code) => code.as_str().to_lowercase(),
            };
            metrics.record_upstream_call(
                self.inner.provider().as_str(),
                &outcome,
                start.elapsed().as_secs_f64(),
            );
        }
        result
    }

    async fn probe(&self) -> Probe {
        self.inner.probe().await
    }
}

/// Feeds response cache lookups into `orbitdeck_cache_lookups_total`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsCacheObserver;

impl CacheObserver for MetricsCacheObserver {
    fn on_lookup(&self, endpoint: &str, hit: bool) {
        if let Some(metrics) = metrics() {
            metrics.record_cache_lookup(endpoint, hit);
        }
    }
}
