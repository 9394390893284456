//! Dataset-catalog (OSDR) listing.

use std::sync::Arc;

use orbitdeck_core::{clamp_param, CacheKey, UpstreamResult};

use crate::client::UpstreamClient;
use crate::request::UpstreamRequest;

pub const LIMIT_DEFAULT: i64 = 20;
pub const LIMIT_MAX: i64 = 100;

/// Normalized listing query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    pub limit: i64,
    pub offset: i64,
    /// Trimmed; `None` when blank.
    pub search: Option<String>,
}

impl CatalogQuery {
    pub fn from_params(limit: Option<&str>, offset: Option<&str>, search: Option<&str>) -> Self {
        Self {
            limit: clamp_param(limit, LIMIT_DEFAULT, 1, LIMIT_MAX),
            offset: clamp_param(offset, 0, 0, i64::MAX),
            search: search
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }

    pub fn cache_key(&self) -> CacheKey {
        let key = CacheKey::new("osdr_list")
            .param("limit", self.limit)
            .param("offset", self.offset);
        match &self.search {
            Some(search) => key.param("search", search),
            None => key,
        }
    }

    fn request(&self) -> UpstreamRequest {
        let req = UpstreamRequest::get("/api/osdr")
            .query("limit", self.limit)
            .query("offset", self.offset);
        match &self.search {
            Some(search) => req.query("search", search),
            None => req,
        }
    }
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self::from_params(None, None, None)
    }
}

#[derive(Clone)]
pub struct CatalogApi {
    client: Arc<dyn UpstreamClient>,
}

impl CatalogApi {
    pub fn new(client: Arc<dyn UpstreamClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<dyn UpstreamClient> {
        &self.client
    }

    pub async fn list(&self, query: &CatalogQuery) -> UpstreamResult {
        self.client.call(query.request()).await
    }
}
