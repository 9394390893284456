//! HttpUpstream against real local sockets.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use orbitdeck_core::{ProviderId, UpstreamErrorCode};
use orbitdeck_upstream::{
    Credentials, HttpUpstream, RetryPolicy, SpaceXApi, UpstreamClient, UpstreamRequest,
};
use serde_json::{json, Value};

type Hits = Arc<AtomicUsize>;

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    addr
}

fn client(addr: SocketAddr) -> HttpUpstream {
    HttpUpstream::new(ProviderId::Telemetry, format!("http://{}", addr))
        .with_timeout(Duration::from_millis(300))
}

fn test_router(hits: Hits) -> Router {
    Router::new()
        .route("/ok", get(|| async { Json(json!({"ok": true, "data": {"altitude": 420}})) }))
        .route("/empty", get(|| async { "" }))
        .route("/html", get(|| async { "<html>down</html>" }))
        .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(json!({}))
            }),
        )
        .route(
            "/flaky",
            get(|State(hits): State<Hits>| async move {
                if hits.fetch_add(1, Ordering::SeqCst) < 2 {
                    StatusCode::BAD_GATEWAY.into_response()
                } else {
                    Json(json!({"attempt": 3})).into_response()
                }
            }),
        )
        .route(
            "/count-404",
            get(|State(hits): State<Hits>| async move {
                hits.fetch_add(1, Ordering::SeqCst);
                StatusCode::NOT_FOUND
            }),
        )
        .route(
            "/echo",
            get(|headers: HeaderMap, Query(q): Query<Vec<(String, String)>>| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                Json(json!({"auth": auth, "query": q}))
            }),
        )
        .route(
            "/v5/launches/query",
            post(|Json(body): Json<Value>| async move { Json(json!({"docs": [], "echo": body})) }),
        )
        .with_state(hits)
}

#[tokio::test]
async fn success_returns_payload() {
    let addr = serve(test_router(Hits::default())).await;
    let result = client(addr).call(UpstreamRequest::get("/ok")).await;
    assert!(result.is_success());
    assert_eq!(result.payload().map(|p| p["data"]["altitude"].clone()), Some(json!(420)));
}

#[tokio::test]
async fn non_2xx_is_upstream_error_with_status() {
    let addr = serve(test_router(Hits::default())).await;
    let result = client(addr).call(UpstreamRequest::get("/missing")).await;
    let failure = result.into_result().err();
    assert_eq!(failure.as_ref().map(|f| f.code), Some(UpstreamErrorCode::UpstreamError));
    assert_eq!(failure.and_then(|f| f.status), Some(404));
}

#[tokio::test]
async fn empty_or_malformed_body_is_invalid_json() {
    let addr = serve(test_router(Hits::default())).await;
    let upstream = client(addr);
    for path in ["/empty", "/html"] {
        let result = upstream.call(UpstreamRequest::get(path)).await;
        assert_eq!(result.error_code(), Some(UpstreamErrorCode::InvalidJson), "path {}", path);
    }
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let addr = serve(test_router(Hits::default())).await;
    let started = std::time::Instant::now();
    let result = client(addr).call(UpstreamRequest::get("/slow")).await;
    assert_eq!(result.error_code(), Some(UpstreamErrorCode::Timeout));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn per_request_timeout_overrides_default() {
    let addr = serve(test_router(Hits::default())).await;
    let upstream = client(addr).with_timeout(Duration::from_secs(30));
    let result = upstream
        .call(UpstreamRequest::get("/slow").timeout(Duration::from_millis(100)))
        .await;
    assert_eq!(result.error_code(), Some(UpstreamErrorCode::Timeout));
}

#[tokio::test]
async fn retries_transient_failures() {
    let hits = Hits::default();
    let addr = serve(test_router(hits.clone())).await;
    let upstream = client(addr).with_retry(RetryPolicy::fixed(3, Duration::from_millis(10)));
    let result = upstream.call(UpstreamRequest::get("/flaky")).await;
    assert!(result.is_success());
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let hits = Hits::default();
    let addr = serve(test_router(hits.clone())).await;
    let upstream = client(addr).with_retry(RetryPolicy::telemetry());
    let result = upstream.call(UpstreamRequest::get("/count-404")).await;
    assert!(!result.is_success());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn missing_credentials_skip_the_call() {
    let hits = Hits::default();
    let addr = serve(test_router(hits.clone())).await;
    let upstream = client(addr).with_credentials(Arc::new(Credentials::Missing));
    let result = upstream.call(UpstreamRequest::get("/count-404")).await;
    assert_eq!(result.error_code(), Some(UpstreamErrorCode::Unauthenticated));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn credentials_are_sent() {
    let addr = serve(test_router(Hits::default())).await;

    let keyed = client(addr).with_credentials(Arc::new(Credentials::api_key("api_key", "DEMO_KEY")));
    let result = keyed.call(UpstreamRequest::get("/echo").query("date", "2024-01-01")).await;
    let query = result.payload().map(|p| p["query"].clone()).unwrap_or_default();
    assert_eq!(query, json!([["date", "2024-01-01"], ["api_key", "DEMO_KEY"]]));

    let basic = client(addr).with_credentials(Arc::new(Credentials::basic_from_parts(
        Some("app".to_string()),
        Some("secret".to_string()),
    )));
    let result = basic.call(UpstreamRequest::get("/echo")).await;
    let auth = result.payload().map(|p| p["auth"].clone()).unwrap_or_default();
    // base64("app:secret")
    assert_eq!(auth, json!("Basic YXBwOnNlY3JldA=="));
}

#[tokio::test]
async fn connection_refused_is_upstream_error_without_status() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let upstream = client(addr);
    let failure = upstream.call(UpstreamRequest::get("/ok")).await.into_result().err();
    assert_eq!(failure.as_ref().map(|f| f.code), Some(UpstreamErrorCode::UpstreamError));
    assert_eq!(failure.and_then(|f| f.status), None);

    let probe = upstream.probe().await;
    assert!(!probe.reachable);
}

#[tokio::test]
async fn probe_counts_any_status_as_reachable() {
    let addr = serve(test_router(Hits::default())).await;
    let probe = client(addr).with_probe_path("/missing").probe().await;
    assert!(probe.reachable);
    assert_eq!(probe.status, Some(404));
}

#[tokio::test]
async fn spacex_posts_launch_query() {
    let addr = serve(test_router(Hits::default())).await;
    let upstream = HttpUpstream::new(ProviderId::SpaceX, format!("http://{}", addr));
    let api = SpaceXApi::new(Arc::new(upstream));
    let result = api.launches(7).await;
    let echo = result.payload().map(|p| p["echo"].clone()).unwrap_or_default();
    assert_eq!(echo["options"]["limit"], json!(7));
}
