//! Typed request builders for each upstream provider.
//!
//! Each wrapper owns an [`UpstreamClient`](crate::UpstreamClient) and turns
//! domain parameters into [`UpstreamRequest`](crate::UpstreamRequest)s. None
//! of them cache or fall back; that is the aggregators' job.

pub mod astronomy;
pub mod catalog;
pub mod nasa;
pub mod spacex;
pub mod telemetry;

pub use astronomy::{AstronomyApi, EVENT_BODIES};
pub use catalog::{CatalogApi, CatalogQuery};
pub use nasa::{ApodQuery, NasaApi, NEO_MAX_WINDOW_DAYS};
pub use spacex::SpaceXApi;
pub use telemetry::{SpaceSource, TelemetryApi};
