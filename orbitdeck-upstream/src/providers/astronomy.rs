//! AstronomyAPI events and body positions (basic auth).

use std::sync::Arc;

use chrono::NaiveDate;
use orbitdeck_core::{Coordinates, UpstreamResult};

use crate::client::UpstreamClient;
use crate::request::UpstreamRequest;

/// Bodies queried for the events feed, in merge order.
pub const EVENT_BODIES: [&str; 2] = ["sun", "moon"];

#[derive(Clone)]
pub struct AstronomyApi {
    client: Arc<dyn UpstreamClient>,
}

impl AstronomyApi {
    pub fn new(client: Arc<dyn UpstreamClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<dyn UpstreamClient> {
        &self.client
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_configured()
    }

    pub async fn events(
        &self,
        body: &str,
        at: Coordinates,
        from: NaiveDate,
        to: NaiveDate,
    ) -> UpstreamResult {
        let request = observer_query(
            UpstreamRequest::get(format!("/api/v2/bodies/events/{}", body)),
            at,
            from,
            to,
        );
        self.client.call(request).await
    }

    pub async fn positions(&self, at: Coordinates, from: NaiveDate, to: NaiveDate) -> UpstreamResult {
        let request = observer_query(UpstreamRequest::get("/api/v2/bodies/positions"), at, from, to);
        self.client.call(request).await
    }
}

fn observer_query(req: UpstreamRequest, at: Coordinates, from: NaiveDate, to: NaiveDate) -> UpstreamRequest {
    req.query("latitude", at.latitude_str())
        .query("longitude", at.longitude_str())
        .query("elevation", 0)
        .query("from_date", from.format("%Y-%m-%d"))
        .query("to_date", to.format("%Y-%m-%d"))
        .query("time", "00:00:00")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observer_query() {
        let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
        let to = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap_or_default();
        let req = observer_query(UpstreamRequest::get("/x"), Coordinates::DEFAULT, from, to);
        assert_eq!(req.query_value("latitude"), Some("55.7558"));
        assert_eq!(req.query_value("longitude"), Some("37.6176"));
        assert_eq!(req.query_value("from_date"), Some("2024-01-01"));
        assert_eq!(req.query_value("to_date"), Some("2024-01-08"));
        assert_eq!(req.query_value("elevation"), Some("0"));
    }
}
