//! SpaceX launch query API.

use std::sync::Arc;

use orbitdeck_core::UpstreamResult;
use serde_json::{json, Value};

use crate::client::UpstreamClient;
use crate::request::UpstreamRequest;

#[derive(Clone)]
pub struct SpaceXApi {
    client: Arc<dyn UpstreamClient>,
}

impl SpaceXApi {
    pub fn new(client: Arc<dyn UpstreamClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<dyn UpstreamClient> {
        &self.client
    }

    /// Most recent launches first.
    pub async fn launches(&self, limit: i64) -> UpstreamResult {
        self.client
            .call(UpstreamRequest::post("/v5/launches/query", launch_query(limit)))
            .await
    }
}

fn launch_query(limit: i64) -> Value {
    json!({
        "query": {},
        "options": {
            "limit": limit,
            "sort": {"date_utc": "desc"},
            "select": ["name", "date_utc", "success", "details", "links", "rocket", "launchpad"]
        }
    })
}
