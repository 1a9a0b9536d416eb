//! Cached catalog listing.
//!
//! Lists every orbit file key under a `(bucket, prefix)` pair, newest-looking
//! product first, and keeps the result for a bounded time so concurrent
//! resolutions share one remote listing.

mod cache;

pub use cache::{Clock, SystemClock, TtlCache};

use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::metrics;
use crate::storage::{list_all_keys, ObjectStore, StorageError};

/// Errors from remote listings (object store or upstream catalog search).
#[derive(Debug, Error)]
pub enum ListingError {
    /// Object store listing failed.
    #[error("Object listing failed: {0}")]
    Storage(#[from] StorageError),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

/// Default cache lifetime for a listing.
pub const DEFAULT_LISTING_TTL: Duration = Duration::from_secs(600);

/// Default number of cached `(bucket, prefix)` listings.
pub const DEFAULT_LISTING_CAPACITY: usize = 10;

type ListingKey = (String, String);

/// Object store listing with a TTL cache in front of it.
pub struct CatalogListing {
    store: Arc<dyn ObjectStore>,
    cache: Mutex<TtlCache<ListingKey, Arc<Vec<String>>>>,
    clock: Arc<dyn Clock>,
}

impl CatalogListing {
    pub fn new(store: Arc<dyn ObjectStore>, ttl: Duration, capacity: usize) -> Self {
        Self::with_clock(store, ttl, capacity, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn ObjectStore>,
        ttl: Duration,
        capacity: usize,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            cache: Mutex::new(TtlCache::new(ttl, capacity)),
            clock,
        }
    }

    /// All keys under `prefix`, sorted in descending byte order.
    pub async fn list(&self, bucket: &str, prefix: &str) -> Result<Arc<Vec<String>>, ListingError> {
        let key = (bucket.to_string(), prefix.to_string());

        // The lock is never held across the remote call; two concurrent misses
        // may both list, and the later insert simply wins.
        let cached = self.cache.lock().unwrap().get(&key, self.clock.now());
        if let Some(keys) = cached {
            metrics::LISTING_CACHE_LOOKUPS.with_label_values(&["hit"]).inc();
            debug!(bucket, prefix, "Listing cache hit");
            return Ok(keys);
        }
        metrics::LISTING_CACHE_LOOKUPS.with_label_values(&["miss"]).inc();

        let mut keys = list_all_keys(self.store.as_ref(), bucket, prefix).await?;
        keys.sort_unstable_by(|a, b| b.cmp(a));
        let keys = Arc::new(keys);

        self.cache
            .lock()
            .unwrap()
            .insert(key, Arc::clone(&keys), self.clock.now());

        Ok(keys)
    }
}
