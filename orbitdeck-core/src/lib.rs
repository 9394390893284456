//! Orbitdeck Core - Data Types
//!
//! Pure data structures shared by every other crate: the response envelope,
//! upstream call results, normalized astronomy events, CMS pages, catalog
//! rows and the parameter/cache-key rules the aggregators rely on.
//! This crate performs no I/O.

pub mod catalog;
pub mod cms;
pub mod envelope;
pub mod error;
pub mod event;
pub mod params;
pub mod upstream;

pub use catalog::{render_csv, CatalogRow, SnapshotName, CSV_COLUMNS};
pub use cms::{sanitize_html, CmsPage, CmsPageUpdate, NewCmsPage, Slug, ALLOWED_TAGS};
pub use envelope::{Envelope, EnvelopeError};
pub use error::{OrbitError, OrbitResult, StorageError, ValidationError};
pub use event::EventRecord;
pub use params::{
    clamp_param, parse_coordinate, parse_date, CacheKey, Coordinates, DAYS_MAX, DAYS_MIN,
};
pub use upstream::{ProviderId, UpstreamErrorCode, UpstreamFailure, UpstreamResult};

/// Timestamp type using UTC timezone.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
