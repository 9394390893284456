//! Orbitdeck Test Utilities
//!
//! Shared test infrastructure for the orbitdeck workspace:
//! - Scripted upstream clients that count their calls
//! - Counting and failing repository wrappers
//! - Proptest generators for query parameters
//! - Canned provider payloads
//! - Envelope assertions

pub use orbitdeck_storage::{InMemoryCatalogStore, InMemoryCmsRepository, ManualClock};

pub use orbitdeck_core::{
    CatalogRow, CmsPage, CmsPageUpdate, Envelope, NewCmsPage, OrbitError, OrbitResult,
    ProviderId, SnapshotName, Slug, StorageError, UpstreamErrorCode, UpstreamFailure,
    UpstreamResult,
};
pub use orbitdeck_upstream::{Probe, UpstreamClient, UpstreamRequest};

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use orbitdeck_storage::{CatalogStore, CmsRepository};
use serde_json::Value;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ============================================================================
// STUB UPSTREAM
// ============================================================================

#[derive(Debug, Clone)]
enum Reply {
    Payload(Value),
    Failure(UpstreamErrorCode),
}

/// Upstream client answering from a per-path script.
///
/// Paths without a scripted reply fail with `UPSTREAM_ERROR`. Every call is
/// recorded, so tests can assert that a request never left the process.
#[derive(Debug)]
pub struct StubUpstream {
    provider: ProviderId,
    configured: bool,
    reachable: bool,
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<UpstreamRequest>>,
}

impl StubUpstream {
    pub fn new(provider: ProviderId) -> Self {
        Self {
            provider,
            configured: true,
            reachable: true,
            replies: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Report missing credentials.
    pub fn unconfigured(mut self) -> Self {
        self.configured = false;
        self
    }

    /// Fail reachability probes.
    pub fn unreachable(mut self) -> Self {
        self.reachable = false;
        self
    }

    /// Answer calls to `path` with `payload`.
    pub fn respond(self, path: impl Into<String>, payload: Value) -> Self {
        lock(&self.replies).insert(path.into(), Reply::Payload(payload));
        self
    }

    /// Fail calls to `path` with `code`.
    pub fn fail(self, path: impl Into<String>, code: UpstreamErrorCode) -> Self {
        lock(&self.replies).insert(path.into(), Reply::Failure(code));
        self
    }

    /// Replace the reply for `path` after construction.
    pub fn set_reply(&self, path: impl Into<String>, payload: Value) {
        lock(&self.replies).insert(path.into(), Reply::Payload(payload));
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        lock(&self.calls).iter().filter(|r| r.path == path).count()
    }

    pub fn requests(&self) -> Vec<UpstreamRequest> {
        lock(&self.calls).clone()
    }

    pub fn into_client(self) -> Arc<dyn UpstreamClient> {
        Arc::new(self)
    }
}

#[async_trait]
impl UpstreamClient for StubUpstream {
    fn provider(&self) -> ProviderId {
        self.provider
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn call(&self, request: UpstreamRequest) -> UpstreamResult {
        let reply = lock(&self.replies).get(&request.path).cloned();
        let path = request.path.clone();
        lock(&self.calls).push(request);

        match reply {
            Some(Reply::Payload(payload)) => UpstreamResult::ok(self.provider, payload),
            Some(Reply::Failure(UpstreamErrorCode::Timeout)) => {
                UpstreamResult::failed(UpstreamFailure::timeout(self.provider))
            }
            Some(Reply::Failure(code)) => UpstreamResult::failed(
                UpstreamFailure::new(self.provider, code, code.default_message()),
            ),
            None => UpstreamResult::failed(
                UpstreamFailure::new(
                    self.provider,
                    UpstreamErrorCode::UpstreamError,
                    format!("no stub reply for {}", path),
                )
                .with_status(502),
            ),
        }
    }

    async fn probe(&self) -> Probe {
        if self.reachable {
            Probe::reachable(200, Duration::from_millis(1))
        } else {
            Probe::unreachable("connection refused", Duration::from_millis(1))
        }
    }
}

/// `Arc<StubUpstream>` shared between a test and the state under test.
pub fn shared(stub: StubUpstream) -> (Arc<StubUpstream>, Arc<dyn UpstreamClient>) {
    let stub = Arc::new(stub);
    let client: Arc<dyn UpstreamClient> = stub.clone();
    (stub, client)
}

// ============================================================================
// STUB REPOSITORIES
// ============================================================================

/// CMS repository that counts lookups and can be switched to failing.
#[derive(Debug, Default)]
pub struct CountingCmsRepository {
    inner: InMemoryCmsRepository,
    verbatim: Mutex<Vec<CmsPage>>,
    lookups: AtomicUsize,
    failing: bool,
}

impl CountingCmsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with [`StorageError::Unavailable`].
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Store `page` exactly as given, skipping the write-side sanitizer,
    /// like a row edited by hand in the database.
    pub fn store_verbatim(&self, page: CmsPage) {
        lock(&self.verbatim).push(page);
    }

    fn check(&self) -> OrbitResult<()> {
        if self.failing {
            return Err(StorageError::Unavailable {
                reason: "connection refused".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl CmsRepository for CountingCmsRepository {
    async fn find_active(&self, slug: &Slug) -> OrbitResult<Option<CmsPage>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let verbatim = lock(&self.verbatim)
            .iter()
            .find(|p| &p.slug == slug && p.is_active)
            .cloned();
        match verbatim {
            Some(page) => Ok(Some(page)),
            None => self.inner.find_active(slug).await,
        }
    }

    async fn list_active(&self) -> OrbitResult<Vec<CmsPage>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let mut pages = self.inner.list_active().await?;
        pages.extend(lock(&self.verbatim).iter().filter(|p| p.is_active).cloned());
        pages.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(pages)
    }

    async fn create(&self, page: NewCmsPage) -> OrbitResult<CmsPage> {
        self.check()?;
        self.inner.create(page).await
    }

    async fn update(&self, slug: &Slug, update: CmsPageUpdate) -> OrbitResult<bool> {
        self.check()?;
        self.inner.update(slug, update).await
    }
}

/// Catalog store whose every call fails.
#[derive(Debug, Default)]
pub struct FailingCatalogStore;

#[async_trait]
impl CatalogStore for FailingCatalogStore {
    async fn current_rows(&self) -> OrbitResult<Vec<CatalogRow>> {
        Err(unavailable())
    }

    async fn snapshot_rows(&self, _name: &SnapshotName) -> OrbitResult<Option<Vec<CatalogRow>>> {
        Err(unavailable())
    }

    async fn list_snapshots(&self) -> OrbitResult<Vec<SnapshotName>> {
        Err(unavailable())
    }
}

fn unavailable() -> OrbitError {
    StorageError::Unavailable {
        reason: "connection refused".to_string(),
    }
    .into()
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for raw query parameters.

    use proptest::prelude::*;

    /// Query values as a browser might send them: integers, decimals,
    /// padded numbers, infinities and garbage.
    pub fn arb_raw_number() -> impl Strategy<Value = String> {
        prop_oneof![
            any::<i64>().prop_map(|n| n.to_string()),
            (-1.0e6f64..1.0e6).prop_map(|f| f.to_string()),
            (-1000i64..1000).prop_map(|n| format!("  {}  ", n)),
            Just("inf".to_string()),
            Just("-inf".to_string()),
            Just("NaN".to_string()),
            Just(String::new()),
            "[a-z]{1,8}",
        ]
    }

    /// Optional query value, absent a quarter of the time.
    pub fn arb_query_value() -> impl Strategy<Value = Option<String>> {
        prop::option::weighted(0.75, arb_raw_number())
    }

    /// Slugs that must never reach storage.
    pub fn arb_invalid_slug() -> impl Strategy<Value = String> {
        prop_oneof![
            "[A-Z]{1,10}",
            "[a-z]{0,5}[./_ %][a-z]{0,5}",
            Just("../etc".to_string()),
            Just(String::new()),
        ]
    }

    /// Slugs accepted by [`Slug::parse`](orbitdeck_core::Slug::parse).
    pub fn arb_valid_slug() -> impl Strategy<Value = String> {
        "[a-z0-9][a-z0-9-]{0,30}"
    }
}

// ============================================================================
// CANNED PAYLOADS
// ============================================================================

pub mod fixtures {
    //! Provider payloads in their raw shapes.

    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::{json, Value};

    /// Fixed instant used by time-dependent tests.
    pub fn test_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0)
            .single()
            .unwrap_or_default()
    }

    /// Sun events in the table shape.
    pub fn sun_events_v1() -> Value {
        json!({
            "data": {
                "table": {
                    "rows": [{
                        "entry": {"id": "sun", "name": "Sun"},
                        "cells": [{
                            "type": "total_solar_eclipse",
                            "eventHighlights": {"peak": {"date": "2024-04-08T18:17:00Z", "altitude": 67.2}},
                            "extraInfo": {"obscuration": 1.0}
                        }]
                    }]
                }
            }
        })
    }

    /// Moon events in the flat rows shape.
    pub fn moon_events_v2() -> Value {
        json!({
            "data": {
                "rows": [{
                    "body": {"id": "moon", "name": "Moon"},
                    "events": [
                        {"type": "Full Moon", "date": "2024-03-25T07:00:00Z", "magnitude": "-12.7"}
                    ]
                }]
            }
        })
    }

    pub fn iss_latest() -> Value {
        json!({
            "ok": true,
            "data": {
                "latitude": 51.64,
                "longitude": -0.12,
                "altitude": 418.2,
                "velocity": 27580.1,
                "fetched_at": "2024-03-01T11:59:30Z"
            }
        })
    }

    pub fn apod_single() -> Value {
        json!({
            "title": "Pillars of Creation",
            "date": "2024-03-01",
            "explanation": "Columns of cool interstellar gas and dust.",
            "url": "https://apod.nasa.gov/apod/image/pillars.jpg",
            "media_type": "image"
        })
    }

    pub fn launches() -> Value {
        json!({
            "docs": [
                {"name": "Starlink 6-40", "date_utc": "2024-02-29T15:30:00.000Z", "success": true},
                {"name": "Crew-8", "date_utc": "2024-03-04T03:53:00.000Z", "success": null}
            ]
        })
    }

    pub fn catalog_page() -> Value {
        json!({
            "items": [
                {"dataset_id": "OSD-379", "title": "Rodent Research 8", "organism": "Mus musculus"}
            ],
            "total": 1
        })
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Envelope assertions over raw JSON.

    use serde_json::Value;

    /// Assert `ok:true` and return `data`.
    #[track_caller]
    pub fn assert_ok_envelope(value: &Value) -> &Value {
        assert_eq!(value["ok"], Value::Bool(true), "expected ok envelope, got {}", value);
        &value["data"]
    }

    /// Assert `ok:false` with this error code.
    #[track_caller]
    pub fn assert_error_code(value: &Value, code: &str) {
        assert_eq!(value["ok"], Value::Bool(false), "expected error envelope, got {}", value);
        assert_eq!(value["error"]["code"], code, "wrong error code in {}", value);
        assert!(
            value["error"]["trace_id"].is_string(),
            "error envelope without trace_id: {}",
            value
        );
    }

    /// Assert a successful envelope with the given `data.source`.
    #[track_caller]
    pub fn assert_source(value: &Value, source: &str) {
        let data = assert_ok_envelope(value);
        assert_eq!(data["source"], source, "wrong source in {}", value);
    }
}
