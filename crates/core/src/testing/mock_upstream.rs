//! Mock upstream provider for testing.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::listing::ListingError;
use crate::orbit::OrbitType;
use crate::upstream::{
    AuthError, AuthSession, Credentials, FetchError, SessionApi, UpstreamCatalog, UpstreamOrbit,
};

/// Mock implementation of both the UpstreamCatalog and SessionApi traits.
///
/// Provides controllable behavior for testing:
/// - Serve configured catalog pages per orbit type
/// - Serve configured file content per product id
/// - Issue sessions and record revocations
/// - Inject search, download, session and revocation failures
///
/// # Example
///
/// ```rust,ignore
/// use orbits_core::testing::MockUpstream;
///
/// let upstream = MockUpstream::new();
/// upstream.set_pages(OrbitType::Precise, vec![vec![UpstreamOrbit::new("f.EOF", "id1")]]).await;
/// upstream.set_content("id1", "payload").await;
///
/// // ... run a reconciliation ...
///
/// assert_eq!(upstream.downloads().await, vec!["id1"]);
/// assert_eq!(upstream.revoked_sessions().await.len(), 1);
/// ```
#[derive(Debug)]
pub struct MockUpstream {
    /// Catalog pages per type; page N is `pages[N - 1]`.
    pages: Arc<RwLock<HashMap<OrbitType, Vec<Vec<UpstreamOrbit>>>>>,
    /// File content by product id.
    content: Arc<RwLock<HashMap<String, Bytes>>>,
    /// Recorded search calls.
    searches: Arc<RwLock<Vec<(OrbitType, u32)>>>,
    /// Recorded download ids.
    downloads: Arc<RwLock<Vec<String>>>,
    /// Session handed out by `create_session`.
    session: Arc<RwLock<AuthSession>>,
    /// Number of sessions issued.
    sessions_created: Arc<RwLock<usize>>,
    /// Session ids passed to `revoke_session`, including failed attempts.
    revoked: Arc<RwLock<Vec<String>>>,
    /// Credentials seen by the last `create_session`.
    last_credentials: Arc<RwLock<Option<Credentials>>>,
    /// If set, the next search fails with this error.
    next_search_error: Arc<RwLock<Option<ListingError>>>,
    /// If set, the next session request fails with this error.
    next_session_error: Arc<RwLock<Option<AuthError>>>,
    /// If set, every revocation fails with this status.
    revoke_status: Arc<RwLock<Option<u16>>>,
    /// Download failures by product id.
    download_failures: Arc<RwLock<HashMap<String, u16>>>,
}

impl Default for MockUpstream {
    fn default() -> Self {
        Self::new()
    }
}

impl MockUpstream {
    /// Create a new mock with an empty catalog.
    pub fn new() -> Self {
        Self {
            pages: Arc::new(RwLock::new(HashMap::new())),
            content: Arc::new(RwLock::new(HashMap::new())),
            searches: Arc::new(RwLock::new(Vec::new())),
            downloads: Arc::new(RwLock::new(Vec::new())),
            session: Arc::new(RwLock::new(AuthSession {
                token: "mock-token".to_string(),
                session_id: "mock-session".to_string(),
            })),
            sessions_created: Arc::new(RwLock::new(0)),
            revoked: Arc::new(RwLock::new(Vec::new())),
            last_credentials: Arc::new(RwLock::new(None)),
            next_search_error: Arc::new(RwLock::new(None)),
            next_session_error: Arc::new(RwLock::new(None)),
            revoke_status: Arc::new(RwLock::new(None)),
            download_failures: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Set the catalog pages for a type. Pages past the end are empty.
    pub async fn set_pages(&self, orbit_type: OrbitType, pages: Vec<Vec<UpstreamOrbit>>) {
        self.pages.write().await.insert(orbit_type, pages);
    }

    /// Set the content served for a product id.
    pub async fn set_content(&self, id: &str, body: impl Into<Bytes>) {
        self.content.write().await.insert(id.to_string(), body.into());
    }

    /// Set the token and session id handed out by `create_session`.
    pub async fn set_session(&self, token: &str, session_id: &str) {
        *self.session.write().await = AuthSession {
            token: token.to_string(),
            session_id: session_id.to_string(),
        };
    }

    /// Get all recorded search calls.
    pub async fn searched_pages(&self) -> Vec<(OrbitType, u32)> {
        self.searches.read().await.clone()
    }

    /// Get all product ids requested for download, including failed ones.
    pub async fn downloads(&self) -> Vec<String> {
        self.downloads.read().await.clone()
    }

    /// Get the number of sessions issued.
    pub async fn sessions_created(&self) -> usize {
        *self.sessions_created.read().await
    }

    /// Get all session ids passed to `revoke_session`.
    pub async fn revoked_sessions(&self) -> Vec<String> {
        self.revoked.read().await.clone()
    }

    /// Get the credentials of the last session request.
    pub async fn last_credentials(&self) -> Option<Credentials> {
        self.last_credentials.read().await.clone()
    }

    /// Configure the next search to fail with the given error.
    pub async fn fail_search(&self, error: ListingError) {
        *self.next_search_error.write().await = Some(error);
    }

    /// Configure the next session request to fail with the given error.
    pub async fn fail_create_session(&self, error: AuthError) {
        *self.next_session_error.write().await = Some(error);
    }

    /// Make every revocation fail with the given status.
    pub async fn fail_revoke(&self, status: u16) {
        *self.revoke_status.write().await = Some(status);
    }

    /// Make downloads of `id` fail with the given status.
    pub async fn fail_download(&self, id: &str, status: u16) {
        self.download_failures
            .write()
            .await
            .insert(id.to_string(), status);
    }

    /// Let every download succeed again.
    pub async fn clear_download_failures(&self) {
        self.download_failures.write().await.clear();
    }
}

#[async_trait]
impl UpstreamCatalog for MockUpstream {
    async fn search_page(
        &self,
        orbit_type: OrbitType,
        page: u32,
    ) -> Result<Vec<UpstreamOrbit>, ListingError> {
        self.searches.write().await.push((orbit_type, page));
        if let Some(err) = self.next_search_error.write().await.take() {
            return Err(err);
        }

        let pages = self.pages.read().await;
        let items = pages
            .get(&orbit_type)
            .and_then(|pages| pages.get(page.saturating_sub(1) as usize))
            .cloned()
            .unwrap_or_default();
        Ok(items)
    }

    async fn download(&self, id: &str, _token: &str) -> Result<Bytes, FetchError> {
        self.downloads.write().await.push(id.to_string());
        if let Some(&status) = self.download_failures.read().await.get(id) {
            return Err(FetchError::Download {
                id: id.to_string(),
                status,
            });
        }

        self.content
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| FetchError::Download {
                id: id.to_string(),
                status: 404,
            })
    }
}

#[async_trait]
impl SessionApi for MockUpstream {
    async fn create_session(&self, credentials: &Credentials) -> Result<AuthSession, AuthError> {
        *self.last_credentials.write().await = Some(credentials.clone());
        if let Some(err) = self.next_session_error.write().await.take() {
            return Err(err);
        }

        *self.sessions_created.write().await += 1;
        Ok(self.session.read().await.clone())
    }

    async fn revoke_session(&self, session: &AuthSession) -> Result<(), AuthError> {
        self.revoked.write().await.push(session.session_id.clone());
        match *self.revoke_status.read().await {
            Some(status) => Err(AuthError::RevokeRejected {
                session_id: session.session_id.clone(),
                status,
            }),
            None => Ok(()),
        }
    }
}
