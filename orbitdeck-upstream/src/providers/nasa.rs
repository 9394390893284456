//! NASA open APIs: APOD, NeoWs feed and DONKI solar flares.

use std::sync::Arc;

use chrono::NaiveDate;
use orbitdeck_core::UpstreamResult;

use crate::client::UpstreamClient;
use crate::request::UpstreamRequest;

/// NeoWs rejects feed windows longer than a week.
pub const NEO_MAX_WINDOW_DAYS: i64 = 7;

/// APOD takes either a date or a random count, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApodQuery {
    Date(NaiveDate),
    Random(i64),
}

impl ApodQuery {
    /// `count > 1` asks for random pictures; otherwise the picture of `date`.
    pub fn new(date: NaiveDate, count: i64) -> Self {
        if count > 1 {
            ApodQuery::Random(count)
        } else {
            ApodQuery::Date(date)
        }
    }
}

#[derive(Clone)]
pub struct NasaApi {
    client: Arc<dyn UpstreamClient>,
}

impl NasaApi {
    pub fn new(client: Arc<dyn UpstreamClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<dyn UpstreamClient> {
        &self.client
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_configured()
    }

    pub async fn apod(&self, query: ApodQuery) -> UpstreamResult {
        let req = UpstreamRequest::get("/planetary/apod").query("thumbs", "true");
        let req = match query {
            ApodQuery::Date(date) => req.query("date", date.format("%Y-%m-%d")),
            ApodQuery::Random(count) => req.query("count", count),
        };
        self.client.call(req).await
    }

    pub async fn neo_feed(&self, start: NaiveDate, end: NaiveDate) -> UpstreamResult {
        let req = UpstreamRequest::get("/neo/rest/v1/feed")
            .query("start_date", start.format("%Y-%m-%d"))
            .query("end_date", end.format("%Y-%m-%d"));
        self.client.call(req).await
    }

    pub async fn solar_flares(&self, start: NaiveDate, end: NaiveDate) -> UpstreamResult {
        let req = UpstreamRequest::get("/DONKI/FLR")
            .query("startDate", start.format("%Y-%m-%d"))
            .query("endDate", end.format("%Y-%m-%d"));
        self.client.call(req).await
    }
}
