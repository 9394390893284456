//! Upstream client trait and its reqwest implementation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use orbitdeck_core::{ProviderId, UpstreamErrorCode, UpstreamFailure, UpstreamResult};
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::credentials::{CredentialSource, Credentials};
use crate::request::{HttpMethod, UpstreamRequest};
use crate::retry::RetryPolicy;

/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Reachability probes give up after this long.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of a reachability probe. Any HTTP answer counts as reachable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Probe {
    pub reachable: bool,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Probe {
    pub fn reachable(status: u16, latency: Duration) -> Self {
        Self {
            reachable: true,
            latency_ms: latency.as_millis() as u64,
            status: Some(status),
            error: None,
        }
    }

    pub fn unreachable(error: impl Into<String>, latency: Duration) -> Self {
        Self {
            reachable: false,
            latency_ms: latency.as_millis() as u64,
            status: None,
            error: Some(error.into()),
        }
    }
}

/// One upstream data provider.
///
/// `call` never fails: every transport, status or decoding problem comes
/// back as a failed [`UpstreamResult`] carrying an [`UpstreamErrorCode`].
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    fn provider(&self) -> ProviderId;

    /// Whether the credentials this provider needs are configured.
    fn is_configured(&self) -> bool;

    async fn call(&self, request: UpstreamRequest) -> UpstreamResult;

    async fn probe(&self) -> Probe;
}

/// [`UpstreamClient`] over HTTP.
pub struct HttpUpstream {
    provider: ProviderId,
    http: Client,
    base_url: String,
    timeout: Duration,
    retry: RetryPolicy,
    credentials: Arc<dyn CredentialSource>,
    probe_path: String,
}

impl HttpUpstream {
    pub fn new(provider: ProviderId, base_url: impl Into<String>) -> Self {
        Self {
            provider,
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::none(),
            credentials: Arc::new(Credentials::NotRequired),
            probe_path: "/".to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialSource>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_probe_path(mut self, path: impl Into<String>) -> Self {
        self.probe_path = path.into();
        self
    }

    /// Share one connection pool across providers.
    pub fn with_http_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn transport_failure(&self, err: reqwest::Error) -> UpstreamFailure {
        if err.is_timeout() {
            UpstreamFailure::timeout(self.provider)
        } else {
            UpstreamFailure::new(self.provider, UpstreamErrorCode::UpstreamError, err.to_string())
        }
    }

    async fn attempt(
        &self,
        request: &UpstreamRequest,
        credentials: &Credentials,
    ) -> Result<Value, UpstreamFailure> {
        let url = self.url(&request.path);
        let builder = match request.method {
            HttpMethod::Get => self.http.get(&url),
            HttpMethod::Post => self.http.post(&url),
        };
        let mut builder = builder
            .timeout(request.timeout.unwrap_or(self.timeout))
            .header(ACCEPT, "application/json")
            .query(&request.query);
        builder = credentials.apply(builder);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| self.transport_failure(e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamFailure::new(
                self.provider,
                UpstreamErrorCode::UpstreamError,
                format!("HTTP {}", status),
            )
            .with_status(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| self.transport_failure(e))?;
        parse_json_body(self.provider, &body)
    }
}

/// Decode a response body. Empty bodies and a bare `null` count as invalid.
pub fn parse_json_body(provider: ProviderId, body: &str) -> Result<Value, UpstreamFailure> {
    let invalid = || {
        UpstreamFailure::new(
            provider,
            UpstreamErrorCode::InvalidJson,
            UpstreamErrorCode::InvalidJson.default_message(),
        )
    };
    if body.trim().is_empty() {
        return Err(invalid());
    }
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Null) | Err(_) => Err(invalid()),
        Ok(value) => Ok(value),
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstream {
    fn provider(&self) -> ProviderId {
        self.provider
    }

    fn is_configured(&self) -> bool {
        !self.credentials.resolve().is_missing()
    }

    async fn call(&self, request: UpstreamRequest) -> UpstreamResult {
        let credentials = self.credentials.resolve();
        if credentials.is_missing() {
            tracing::info!(provider = %self.provider, path = %request.path, "credentials missing, call skipped");
            return UpstreamResult::failed(UpstreamFailure::unauthenticated(self.provider));
        }

        let mut attempt = 1;
        loop {
            match self.attempt(&request, &credentials).await {
                Ok(payload) => return UpstreamResult::ok(self.provider, payload),
                Err(failure)
                    if attempt < self.retry.max_attempts && self.retry.should_retry(&failure) =>
                {
                    tracing::debug!(
                        provider = %self.provider,
                        attempt,
                        code = %failure.code,
                        "upstream call failed, retrying"
                    );
                    tokio::time::sleep(self.retry.delay).await;
                    attempt += 1;
                }
                Err(failure) => {
                    tracing::warn!(
                        provider = %self.provider,
                        method = %request.method,
                        path = %request.path,
                        code = %failure.code,
                        status = ?failure.status,
                        attempt,
                        "upstream call failed"
                    );
                    return UpstreamResult::failed(failure);
                }
            }
        }
    }

    async fn probe(&self) -> Probe {
        let started = Instant::now();
        let result = self
            .http
            .get(self.url(&self.probe_path))
            .timeout(PROBE_TIMEOUT)
            .send()
            .await;
        match result {
            Ok(response) => Probe::reachable(response.status().as_u16(), started.elapsed()),
            Err(e) => Probe::unreachable(e.to_string(), started.elapsed()),
        }
    }
}

impl std::fmt::Debug for HttpUpstream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpUpstream")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("credentials", &"[REDACTED]")
            .finish()
    }
}
