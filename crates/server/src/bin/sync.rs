//! One-shot reconciliation of the mirror bucket with the upstream catalog.
//!
//! Usage: `orbits-sync [TYPE...]`, where TYPE is `AUX_POEORB`, `AUX_RESORB`
//! or `AUX_PREORB`. Without arguments the `sync.orbit_types` setting is used.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use orbits_core::{
    load_config, validate_config, CdseClient, ObjectStore, OrbitType, Reconciler, S3Store,
    SessionApi, UpstreamCatalog,
};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var("ORBITS_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    let orbit_types = parse_orbit_types(std::env::args().skip(1), &config.sync.orbit_types)?;

    let credentials = config.credentials();
    if !credentials.is_configured() {
        bail!("upstream.username and upstream.password must be set");
    }

    let store: Arc<dyn ObjectStore> = Arc::new(S3Store::new(&config.storage.s3).await);
    let cdse = Arc::new(
        CdseClient::new(config.upstream.cdse.clone()).context("Failed to create CDSE client")?,
    );

    let reconciler = Reconciler::new(
        store,
        Arc::clone(&cdse) as Arc<dyn UpstreamCatalog>,
        cdse as Arc<dyn SessionApi>,
        credentials,
        config.sync_options(),
    );

    info!(
        "Reconciling bucket {} for {:?}",
        config.storage.bucket, orbit_types
    );
    let report = reconciler
        .sync(&orbit_types)
        .await
        .context("Reconciliation failed")?;

    for stats in &report.types {
        info!(
            orbit_type = %stats.orbit_type,
            local = stats.local,
            upstream = stats.upstream,
            missing = stats.missing,
            copied = stats.copied,
            "Orbit type reconciled"
        );
    }
    info!("Copied {} orbit files", report.copied);

    Ok(())
}

/// Orbit types named on the command line, or `fallback` when none are.
fn parse_orbit_types(
    args: impl Iterator<Item = String>,
    fallback: &[OrbitType],
) -> Result<Vec<OrbitType>> {
    let parsed = args
        .map(|arg| arg.parse::<OrbitType>())
        .collect::<Result<Vec<_>, _>>()
        .context("Invalid orbit type argument")?;

    if parsed.is_empty() {
        Ok(fallback.to_vec())
    } else {
        Ok(parsed)
    }
}
