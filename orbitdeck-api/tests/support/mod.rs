//! Router harness over stub upstreams, in-memory storage and a manual clock.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use orbitdeck_api::{
    create_api_router, ApiConfig, ApiError, ApiResult, AppState, Backends, DatabaseHealth,
    Upstreams,
};
use orbitdeck_core::ProviderId;
use orbitdeck_storage::{CatalogStore, InMemoryCacheBackend, ResponseCache};
use orbitdeck_test_utils::{
    fixtures, CountingCmsRepository, InMemoryCatalogStore, ManualClock, StubUpstream,
};
use serde_json::Value;
use tower::ServiceExt;

/// Database health that is either up or refusing connections.
pub struct StubDatabase {
    pub up: bool,
}

#[async_trait]
impl DatabaseHealth for StubDatabase {
    async fn health_check(&self) -> ApiResult<()> {
        if self.up {
            Ok(())
        } else {
            Err(ApiError::database_error("connection refused"))
        }
    }
}

/// Scripted upstreams, one per provider. Unscripted paths fail.
pub struct Stubs {
    pub telemetry: StubUpstream,
    pub catalog: StubUpstream,
    pub nasa: StubUpstream,
    pub astronomy: StubUpstream,
    pub spacex: StubUpstream,
}

impl Default for Stubs {
    fn default() -> Self {
        Self {
            telemetry: StubUpstream::new(ProviderId::Telemetry),
            catalog: StubUpstream::new(ProviderId::Catalog),
            nasa: StubUpstream::new(ProviderId::Nasa),
            astronomy: StubUpstream::new(ProviderId::Astronomy),
            spacex: StubUpstream::new(ProviderId::SpaceX),
        }
    }
}

pub struct Harness {
    pub telemetry: Arc<StubUpstream>,
    pub catalog: Arc<StubUpstream>,
    pub nasa: Arc<StubUpstream>,
    pub astronomy: Arc<StubUpstream>,
    pub spacex: Arc<StubUpstream>,
    pub cms: Arc<CountingCmsRepository>,
    pub clock: Arc<ManualClock>,
    router: Router,
}

impl Harness {
    pub fn new(stubs: Stubs) -> Self {
        Self::build(
            stubs,
            Arc::new(CountingCmsRepository::new()),
            Arc::new(InMemoryCatalogStore::new()),
            true,
        )
    }

    pub fn build(
        stubs: Stubs,
        cms: Arc<CountingCmsRepository>,
        catalog_store: Arc<dyn CatalogStore>,
        database_up: bool,
    ) -> Self {
        let telemetry = Arc::new(stubs.telemetry);
        let catalog = Arc::new(stubs.catalog);
        let nasa = Arc::new(stubs.nasa);
        let astronomy = Arc::new(stubs.astronomy);
        let spacex = Arc::new(stubs.spacex);

        let upstreams = Upstreams {
            telemetry: telemetry.clone(),
            catalog: catalog.clone(),
            nasa: nasa.clone(),
            astronomy: astronomy.clone(),
            spacex: spacex.clone(),
        };
        let backends = Backends {
            cms: cms.clone(),
            catalog: catalog_store,
            database: Arc::new(StubDatabase { up: database_up }),
        };

        let clock = Arc::new(ManualClock::new(fixtures::test_now()));
        let cache = Arc::new(ResponseCache::new(
            Arc::new(InMemoryCacheBackend::new()),
            clock.clone(),
        ));
        let state = AppState::with_cache(upstreams, backends, cache, clock.clone());

        Self {
            telemetry,
            catalog,
            nasa,
            astronomy,
            spacex,
            cms,
            clock,
            router: create_api_router(state, &ApiConfig::default()),
        }
    }

    /// GET `uri`, returning status, content type and body bytes.
    pub async fn get_raw(&self, uri: &str) -> Result<(StatusCode, String, Vec<u8>), String> {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .map_err(|e| e.to_string())?;
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .map_err(|e| e.to_string())?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| e.to_string())?;
        Ok((status, content_type, body.to_vec()))
    }

    /// GET `uri` and decode the body as JSON.
    pub async fn get_json(&self, uri: &str) -> Result<(StatusCode, Value), String> {
        let (status, _, body) = self.get_raw(uri).await?;
        let json = serde_json::from_slice(&body).map_err(|e| e.to_string())?;
        Ok((status, json))
    }
}
