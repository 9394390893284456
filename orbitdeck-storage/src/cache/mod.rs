//! Response cache layer.
//!
//! Callers go through [`ResponseCache`], which decides liveness with an
//! injected [`Clock`] and stores whole [`CacheEntry`] values in a pluggable
//! [`CacheBackend`]. Swapping the in-memory backend for a shared one does not
//! change any caller.
//!
//! # Example
//!
//! ```ignore
//! let cache = ResponseCache::in_memory();
//! let key = CacheKey::new("space_apod").param("count", 1);
//! let value = cache
//!     .get_or_compute(&key, Duration::from_secs(43_200), || async { fetch().await })
//!     .await;
//! ```

pub mod clock;
pub mod memory;
pub mod response;
pub mod traits;

pub use clock::{Clock, ManualClock, SystemClock};
pub use memory::{InMemoryCacheBackend, DEFAULT_MAX_ENTRIES};
pub use response::{CacheObserver, ResponseCache};
pub use traits::{CacheBackend, CacheEntry, CacheStats};
