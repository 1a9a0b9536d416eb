//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Orbit resolution (results per granule, listing cache efficiency)
//! - Catalog reconciliation (runs, files copied, upstream pages)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Resolution
// =============================================================================

/// Granule resolutions by result.
pub static RESOLUTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("orbits_resolutions_total", "Total granule resolutions"),
        &["result"], // "AUX_POEORB", "AUX_RESORB", "AUX_PREORB", "not_found", "error"
    )
    .unwrap()
});

/// Listing cache lookups by outcome.
pub static LISTING_CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "orbits_listing_cache_lookups_total",
            "Catalog listing cache lookups",
        ),
        &["outcome"], // "hit", "miss"
    )
    .unwrap()
});

// =============================================================================
// Reconciliation
// =============================================================================

/// Reconciliation runs by result.
pub static SYNC_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("orbits_sync_runs_total", "Total reconciliation runs"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Orbit files copied from upstream.
pub static FILES_COPIED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("orbits_files_copied_total", "Orbit files copied from upstream"),
        &["orbit_type"],
    )
    .unwrap()
});

/// Upstream catalog search pages fetched.
pub static UPSTREAM_PAGES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "orbits_upstream_pages_total",
        "Upstream catalog search pages fetched",
    )
    .unwrap()
});

/// Duration of single file downloads from upstream.
pub static DOWNLOAD_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "orbits_download_duration_seconds",
            "Duration of orbit file downloads",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(RESOLUTIONS.clone()),
        Box::new(LISTING_CACHE_LOOKUPS.clone()),
        Box::new(SYNC_RUNS.clone()),
        Box::new(FILES_COPIED.clone()),
        Box::new(UPSTREAM_PAGES.clone()),
        Box::new(DOWNLOAD_DURATION.clone()),
    ]
}
