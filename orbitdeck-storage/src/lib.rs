//! Orbitdeck Storage - Cache Layer and Repository Traits
//!
//! The response cache every aggregator goes through, and the repository
//! traits for CMS pages and catalog rows with in-memory implementations.
//! The Postgres implementations live in orbitdeck-api.

pub mod cache;
pub mod catalog;
pub mod cms;

pub use cache::{
    CacheBackend, CacheEntry, CacheObserver, CacheStats, Clock, InMemoryCacheBackend, ManualClock,
    ResponseCache, SystemClock,
};
pub use catalog::{CatalogStore, InMemoryCatalogStore};
pub use cms::{find_active_by_raw_slug, CmsRepository, InMemoryCmsRepository};
