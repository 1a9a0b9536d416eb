//! Catalog reconciliation.
//!
//! Brings the mirror bucket up to date with the upstream catalog: every
//! upstream file whose name is missing from the bucket is downloaded and
//! stored under its type namespace. A run opens exactly one upstream session
//! and copies sequentially, stopping at the first failure. Files already
//! copied stay in place, so a re-run picks up where the last one stopped.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::listing::ListingError;
use crate::metrics;
use crate::orbit::{basename, OrbitType};
use crate::storage::{list_all_keys, ObjectStore};
use crate::upstream::{
    list_upstream_orbits, with_session, AuthError, Credentials, FetchError, SessionApi,
    UpstreamCatalog, UpstreamOrbit,
};

/// Errors that abort a reconciliation run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Inventory failed: {0}")]
    Listing(#[from] ListingError),

    #[error("Session failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Copy failed: {0}")]
    Fetch(#[from] FetchError),
}

impl From<crate::storage::StorageError> for SyncError {
    fn from(e: crate::storage::StorageError) -> Self {
        SyncError::Listing(ListingError::Storage(e))
    }
}

/// Which keys count as "already mirrored" for a type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalScope {
    /// Only keys under the type's namespace.
    #[default]
    Prefix,
    /// Every key in the bucket, whatever its prefix.
    Bucket,
}

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub bucket: String,
    /// Pause between consecutive downloads.
    pub pace: Option<Duration>,
    pub local_scope: LocalScope,
}

impl SyncOptions {
    pub fn for_bucket(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            pace: None,
            local_scope: LocalScope::default(),
        }
    }
}

/// Inventory counts for one orbit type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeReport {
    pub orbit_type: OrbitType,
    pub local: usize,
    pub upstream: usize,
    pub missing: usize,
    pub copied: usize,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub copied: usize,
    pub types: Vec<TypeReport>,
}

/// A file to copy, tagged with the namespace it belongs to.
#[derive(Debug, Clone)]
struct PendingCopy {
    orbit_type: OrbitType,
    orbit: UpstreamOrbit,
}

pub struct Reconciler {
    store: Arc<dyn ObjectStore>,
    upstream: Arc<dyn UpstreamCatalog>,
    sessions: Arc<dyn SessionApi>,
    credentials: Credentials,
    options: SyncOptions,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        upstream: Arc<dyn UpstreamCatalog>,
        sessions: Arc<dyn SessionApi>,
        credentials: Credentials,
        options: SyncOptions,
    ) -> Self {
        Self {
            store,
            upstream,
            sessions,
            credentials,
            options,
        }
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Mirror every missing upstream file of the given types.
    pub async fn sync(&self, orbit_types: &[OrbitType]) -> Result<SyncReport, SyncError> {
        let result = self.run(orbit_types).await;
        match &result {
            Ok(report) => {
                metrics::SYNC_RUNS.with_label_values(&["success"]).inc();
                info!(copied = report.copied, "Reconciliation finished");
            }
            Err(e) => {
                metrics::SYNC_RUNS.with_label_values(&["failed"]).inc();
                warn!(error = %e, "Reconciliation aborted");
            }
        }
        result
    }

    async fn run(&self, orbit_types: &[OrbitType]) -> Result<SyncReport, SyncError> {
        let mut types = Vec::with_capacity(orbit_types.len());
        let mut pending = Vec::new();
        let mut requested = HashSet::new();

        for &orbit_type in orbit_types {
            if !requested.insert(orbit_type) {
                continue;
            }
            let local = self.local_inventory(orbit_type).await?;
            let upstream = list_upstream_orbits(self.upstream.as_ref(), orbit_type).await?;
            let missing = diff(&local, &upstream);

            info!(
                orbit_type = %orbit_type,
                local = local.len(),
                upstream = upstream.len(),
                missing = missing.len(),
                "Compared inventories"
            );

            types.push(TypeReport {
                orbit_type,
                local: local.len(),
                upstream: upstream.len(),
                missing: missing.len(),
                copied: 0,
            });
            pending.extend(missing.into_iter().map(|orbit| PendingCopy { orbit_type, orbit }));
        }

        let copied = with_session(self.sessions.as_ref(), &self.credentials, |token| {
            self.copy_all(&pending, token)
        })
        .await?;

        // A run either copies everything missing or fails
        for stats in &mut types {
            stats.copied = stats.missing;
        }
        Ok(SyncReport { copied, types })
    }

    /// Basenames already present in the bucket for `orbit_type`.
    async fn local_inventory(&self, orbit_type: OrbitType) -> Result<HashSet<String>, SyncError> {
        let prefix = match self.options.local_scope {
            LocalScope::Prefix => orbit_type.namespace(),
            LocalScope::Bucket => "",
        };
        let keys = list_all_keys(self.store.as_ref(), &self.options.bucket, prefix).await?;
        Ok(keys.iter().map(|k| basename(k).to_string()).collect())
    }

    async fn copy_all(&self, pending: &[PendingCopy], token: String) -> Result<usize, SyncError> {
        for (i, copy) in pending.iter().enumerate() {
            if i > 0 {
                if let Some(pace) = self.options.pace {
                    tokio::time::sleep(pace).await;
                }
            }

            let key = copy.orbit_type.storage_key(&copy.orbit.filename);
            debug!(id = copy.orbit.id.as_str(), key = key.as_str(), "Copying orbit file");

            let body = self.upstream.download(&copy.orbit.id, &token).await?;
            self.store
                .put(&self.options.bucket, &key, body)
                .await
                .map_err(FetchError::from)?;

            metrics::FILES_COPIED
                .with_label_values(&[copy.orbit_type.namespace()])
                .inc();
            info!(key = key.as_str(), "Copied orbit file");
        }
        Ok(pending.len())
    }
}

/// Upstream entries whose file name is not in `local`, in upstream order.
///
/// A file listed more than once upstream is kept at its first occurrence.
fn diff(local: &HashSet<String>, upstream: &[UpstreamOrbit]) -> Vec<UpstreamOrbit> {
    let mut seen = HashSet::new();
    upstream
        .iter()
        .filter(|orbit| !local.contains(&orbit.filename))
        .filter(|&orbit| seen.insert(orbit.filename.as_str()))
        .cloned()
        .collect()
}
