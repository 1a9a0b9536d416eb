//! Upstream orbit provider integration.
//!
//! The provider exposes three surfaces: a paged catalog search, a token
//! endpoint issuing per-session bearer tokens, and a download endpoint.
//! [`CdseClient`] implements them against the Copernicus Data Space
//! Ecosystem; the traits let tests substitute doubles.

mod cdse;
mod session;
mod types;

pub use cdse::{CdseClient, CdseConfig};
pub use session::with_session;
pub use types::*;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

use crate::listing::ListingError;
use crate::metrics;
use crate::orbit::OrbitType;

/// Errors from the token endpoint.
#[derive(Debug, Error)]
pub enum AuthError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Token issuance rejected.
    #[error("Token request rejected: {status} - {message}")]
    TokenRejected { status: u16, message: String },

    /// Session revocation rejected.
    #[error("Session {session_id} revocation rejected: {status}")]
    RevokeRejected { session_id: String, status: u16 },

    /// Failed to parse response.
    #[error("Failed to parse token response: {0}")]
    Parse(String),
}

/// Errors while copying a file from upstream into the store.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Download endpoint returned an error.
    #[error("Download of {id} failed: {status}")]
    Download { id: String, status: u16 },

    /// Writing into the store failed.
    #[error("Upload failed: {0}")]
    Upload(#[from] crate::storage::StorageError),
}

/// Paged catalog search and content download.
#[async_trait]
pub trait UpstreamCatalog: Send + Sync {
    /// One page (1-based) of catalog entries for a product type.
    async fn search_page(
        &self,
        orbit_type: OrbitType,
        page: u32,
    ) -> Result<Vec<UpstreamOrbit>, ListingError>;

    /// Download file content with a session token.
    async fn download(&self, id: &str, token: &str) -> Result<Bytes, FetchError>;
}

/// Session issuance and revocation.
#[async_trait]
pub trait SessionApi: Send + Sync {
    async fn create_session(&self, credentials: &Credentials) -> Result<AuthSession, AuthError>;

    async fn revoke_session(&self, session: &AuthSession) -> Result<(), AuthError>;
}

/// Every catalog entry for `orbit_type`, in discovery order.
///
/// Pages are requested from 1 upwards until a page comes back empty.
pub async fn list_upstream_orbits(
    catalog: &dyn UpstreamCatalog,
    orbit_type: OrbitType,
) -> Result<Vec<UpstreamOrbit>, ListingError> {
    let mut orbits = Vec::new();
    let mut page = 1;

    loop {
        let items = catalog.search_page(orbit_type, page).await?;
        metrics::UPSTREAM_PAGES.inc();
        if items.is_empty() {
            break;
        }
        orbits.extend(items);
        page += 1;
    }

    debug!(orbit_type = %orbit_type, pages = page, found = orbits.len(), "Listed upstream catalog");
    Ok(orbits)
}
