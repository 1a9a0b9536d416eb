//! Orbit file resolution.
//!
//! Given a granule, find the orbit file whose validity interval covers the
//! granule's search window. Orbit types are tried in preference order and,
//! within a type, the catalog is scanned newest product first so a
//! reprocessed file wins over an older one covering the same window.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::listing::{CatalogListing, ListingError};
use crate::metrics;
use crate::orbit::{Granule, OrbitFile, OrbitType, ParseError, WindowMode};

/// Errors that abort a resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Listing(#[from] ListingError),
}

/// Resolver settings.
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Bucket holding the mirrored orbit files.
    pub bucket: String,
    /// Prefix joined with the resolved key to form the returned location.
    pub location_base: String,
    /// Orbit types to try, most preferred first.
    pub orbit_types: Vec<OrbitType>,
    pub window: WindowMode,
}

impl ResolverOptions {
    /// Defaults for a public S3 bucket.
    pub fn for_bucket(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            location_base: format!("https://{}.s3.amazonaws.com", bucket),
            orbit_types: OrbitType::ALL.to_vec(),
            window: WindowMode::default(),
        }
    }
}

/// Finds the best orbit file for a granule.
pub struct OrbitResolver {
    listing: Arc<CatalogListing>,
    options: ResolverOptions,
}

impl OrbitResolver {
    pub fn new(listing: Arc<CatalogListing>, options: ResolverOptions) -> Self {
        Self { listing, options }
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Newest catalog entry of `orbit_type` that covers the granule.
    pub async fn resolve_for_type(
        &self,
        granule: &Granule,
        orbit_type: OrbitType,
    ) -> Result<Option<OrbitFile>, ResolveError> {
        let prefix = format!("{}/{}", orbit_type.namespace(), granule.platform());
        let window = self
            .options
            .window
            .apply(granule.acquisition_start(), granule.acquisition_end())?;

        let keys = self.listing.list(&self.options.bucket, &prefix).await?;

        debug!(
            granule = granule.name(),
            orbit_type = %orbit_type,
            candidates = keys.len(),
            window_start = %window.start,
            window_end = %window.end,
            "Scanning orbit catalog"
        );

        for key in keys.iter() {
            let orbit = match OrbitFile::parse(key, orbit_type) {
                Ok(orbit) => orbit,
                Err(e) => {
                    warn!(key = key.as_str(), error = %e, "Skipping unparseable catalog entry");
                    continue;
                }
            };
            if orbit.covers(window.start, window.end) {
                return Ok(Some(orbit));
            }
        }

        Ok(None)
    }

    /// Location of the best orbit file across all configured types.
    pub async fn resolve(&self, granule: &Granule) -> Result<Option<String>, ResolveError> {
        let found = match self.find(granule).await {
            Ok(found) => found,
            Err(e) => {
                metrics::RESOLUTIONS.with_label_values(&["error"]).inc();
                return Err(e);
            }
        };

        match found {
            Some(orbit) => {
                metrics::RESOLUTIONS
                    .with_label_values(&[orbit.orbit_type.namespace()])
                    .inc();
                info!(granule = granule.name(), key = orbit.key.as_str(), "Resolved orbit file");
                Ok(Some(self.location(&orbit.key)))
            }
            None => {
                metrics::RESOLUTIONS.with_label_values(&["not_found"]).inc();
                info!(granule = granule.name(), "No orbit file covers granule");
                Ok(None)
            }
        }
    }

    async fn find(&self, granule: &Granule) -> Result<Option<OrbitFile>, ResolveError> {
        for orbit_type in &self.options.orbit_types {
            if let Some(orbit) = self.resolve_for_type(granule, *orbit_type).await? {
                return Ok(Some(orbit));
            }
        }
        Ok(None)
    }

    fn location(&self, key: &str) -> String {
        format!("{}/{}", self.options.location_base.trim_end_matches('/'), key)
    }
}
