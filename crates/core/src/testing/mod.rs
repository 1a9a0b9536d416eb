//! Testing utilities and mock implementations.
//!
//! Mock implementations of the storage, upstream and clock seams, so the
//! resolver and reconciler can be exercised without S3 or CDSE.
//!
//! # Example
//!
//! ```rust,ignore
//! use orbits_core::testing::{fixtures, MockObjectStore, MockUpstream};
//!
//! let store = MockObjectStore::new();
//! store.insert("bucket", &fixtures::orbit_key(OrbitType::Precise, "S1A", ...), "").await;
//!
//! let upstream = MockUpstream::new();
//! upstream.set_pages(OrbitType::Precise, vec![vec![/* orbits */]]).await;
//! ```

mod mock_store;
mod mock_upstream;

pub use mock_store::MockObjectStore;
pub use mock_upstream::MockUpstream;

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::listing::Clock;

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.elapsed.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.elapsed.lock().unwrap()
    }
}

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::orbit::OrbitType;
    use crate::upstream::UpstreamOrbit;

    /// Storage key of an orbit file with the given production time and
    /// validity interval.
    pub fn orbit_key(
        orbit_type: OrbitType,
        platform: &str,
        produced: &str,
        validity_start: &str,
        validity_end: &str,
    ) -> String {
        orbit_type.storage_key(&orbit_filename(
            orbit_type,
            platform,
            produced,
            validity_start,
            validity_end,
        ))
    }

    /// File name of an orbit file, as published upstream.
    pub fn orbit_filename(
        orbit_type: OrbitType,
        platform: &str,
        produced: &str,
        validity_start: &str,
        validity_end: &str,
    ) -> String {
        format!(
            "{}_OPER_{}_OPOD_{}_V{}_{}.EOF",
            platform,
            orbit_type.namespace(),
            produced,
            validity_start,
            validity_end
        )
    }

    /// Granule name for an acquisition window, with fixed mode and product
    /// identifiers.
    pub fn granule_name(platform: &str, start: &str, end: &str) -> String {
        format!(
            "{}_IW_GRDH_1SDV_{}_{}_048541_05D6B8_579B",
            platform, start, end
        )
    }

    /// Upstream catalog entry for a file name, with the id derived from it.
    pub fn upstream_orbit(filename: &str) -> UpstreamOrbit {
        UpstreamOrbit::new(filename, format!("id-{}", filename))
    }
}
