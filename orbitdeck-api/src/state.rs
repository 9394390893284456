//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use orbitdeck_core::ProviderId;
use orbitdeck_storage::{CatalogStore, Clock, CmsRepository, ResponseCache, SystemClock};
use orbitdeck_upstream::{
    AstronomyApi, CatalogApi, HttpUpstream, NasaApi, RetryPolicy, SpaceXApi, TelemetryApi,
    UpstreamClient, PROBE_TIMEOUT,
};

use crate::aggregator::{AstroAggregator, ProxyAggregator, SpaceAggregator};
use crate::config::{EnvCredentials, UpstreamConfig};
use crate::db::DatabaseHealth;
use crate::error::{ApiError, ApiResult};
use crate::export::ExportService;
use crate::routes::health::HealthState;
use crate::telemetry::{InstrumentedUpstream, MetricsCacheObserver};

// ============================================================================
// UPSTREAM CLIENTS
// ============================================================================

/// One client per upstream provider.
#[derive(Clone)]
pub struct Upstreams {
    pub telemetry: Arc<dyn UpstreamClient>,
    pub catalog: Arc<dyn UpstreamClient>,
    pub nasa: Arc<dyn UpstreamClient>,
    pub astronomy: Arc<dyn UpstreamClient>,
    pub spacex: Arc<dyn UpstreamClient>,
}

impl Upstreams {
    /// HTTP clients sharing one connection pool, each wrapped in
    /// [`InstrumentedUpstream`].
    pub fn from_config(config: &UpstreamConfig) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("orbitdeck/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(PROBE_TIMEOUT)
            .build()
            .map_err(|e| ApiError::internal_error(format!("Failed to build HTTP client: {}", e)))?;

        let client = |provider: ProviderId, base: &str| {
            HttpUpstream::new(provider, base).with_http_client(http.clone())
        };

        let telemetry = client(ProviderId::Telemetry, &config.telemetry_url)
            .with_timeout(config.telemetry_timeout)
            .with_retry(RetryPolicy::telemetry())
            .with_probe_path("/health");
        let catalog = client(ProviderId::Catalog, &config.catalog_url)
            .with_timeout(config.telemetry_timeout)
            .with_retry(RetryPolicy::telemetry())
            .with_probe_path("/health");
        let nasa = client(ProviderId::Nasa, &config.nasa_url)
            .with_timeout(config.upstream_timeout)
            .with_credentials(Arc::new(EnvCredentials::NasaApiKey));
        let astronomy = client(ProviderId::Astronomy, &config.astro_url)
            .with_timeout(config.upstream_timeout)
            .with_credentials(Arc::new(EnvCredentials::AstronomyBasic));
        let spacex = client(ProviderId::SpaceX, &config.spacex_url)
            .with_timeout(config.upstream_timeout)
            .with_probe_path("/v5/launches/latest");

        Ok(Self {
            telemetry: InstrumentedUpstream::wrap(Arc::new(telemetry)),
            catalog: InstrumentedUpstream::wrap(Arc::new(catalog)),
            nasa: InstrumentedUpstream::wrap(Arc::new(nasa)),
            astronomy: InstrumentedUpstream::wrap(Arc::new(astronomy)),
            spacex: InstrumentedUpstream::wrap(Arc::new(spacex)),
        })
    }

    /// Every client, in [`ProviderId::ALL`] order.
    pub fn all(&self) -> Vec<Arc<dyn UpstreamClient>> {
        vec![
            self.telemetry.clone(),
            self.catalog.clone(),
            self.astronomy.clone(),
            self.nasa.clone(),
            self.spacex.clone(),
        ]
    }
}

/// Storage collaborators behind the page-style endpoints.
#[derive(Clone)]
pub struct Backends {
    pub cms: Arc<dyn CmsRepository>,
    pub catalog: Arc<dyn CatalogStore>,
    pub database: Arc<dyn DatabaseHealth>,
}

// ============================================================================
// APPLICATION STATE
// ============================================================================

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub proxy: ProxyAggregator,
    pub space: SpaceAggregator,
    pub astro: AstroAggregator,
    pub export: ExportService,
    pub cms: Arc<dyn CmsRepository>,
    pub health: Arc<HealthState>,
}

impl AppState {
    /// Wire aggregators to `upstreams`, all sharing one in-memory response
    /// cache on the system clock.
    pub fn new(upstreams: Upstreams, backends: Backends) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let cache = ResponseCache::in_memory().with_observer(Arc::new(MetricsCacheObserver));
        Self::with_cache(upstreams, backends, Arc::new(cache), clock)
    }

    /// Like [`new`](Self::new) with an explicit cache and clock.
    pub fn with_cache(
        upstreams: Upstreams,
        backends: Backends,
        cache: Arc<ResponseCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            proxy: ProxyAggregator::new(
                TelemetryApi::new(upstreams.telemetry.clone()),
                CatalogApi::new(upstreams.catalog.clone()),
                cache.clone(),
            ),
            space: SpaceAggregator::new(
                NasaApi::new(upstreams.nasa.clone()),
                SpaceXApi::new(upstreams.spacex.clone()),
                cache.clone(),
                clock.clone(),
            ),
            astro: AstroAggregator::new(
                AstronomyApi::new(upstreams.astronomy.clone()),
                cache.clone(),
                clock.clone(),
            ),
            export: ExportService::new(backends.catalog, clock),
            cms: backends.cms,
            health: Arc::new(HealthState::new(
                backends.database,
                upstreams.all(),
                cache,
                Instant::now(),
            )),
        }
    }
}

crate::impl_from_ref!(ProxyAggregator, proxy);
crate::impl_from_ref!(SpaceAggregator, space);
crate::impl_from_ref!(AstroAggregator, astro);
crate::impl_from_ref!(ExportService, export);
crate::impl_from_ref!(Arc<dyn CmsRepository>, cms);
crate::impl_from_ref!(Arc<HealthState>, health);
