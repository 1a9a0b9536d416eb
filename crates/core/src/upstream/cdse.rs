//! Copernicus Data Space Ecosystem (CDSE) client.
//!
//! Catalog search is anonymous. Downloads need a bearer token issued by the
//! CDSE identity service; each token belongs to a server-side session that
//! must be deleted once the caller is done with it.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    AuthError, AuthSession, Credentials, FetchError, SessionApi, UpstreamCatalog, UpstreamOrbit,
};
use crate::listing::ListingError;
use crate::metrics;
use crate::orbit::OrbitType;

/// CDSE endpoints and client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CdseConfig {
    /// Token issuance endpoint.
    #[serde(default = "default_token_url")]
    pub token_url: String,
    /// Session endpoint; a session is revoked with `DELETE <sessions_url>/<id>`.
    #[serde(default = "default_sessions_url")]
    pub sessions_url: String,
    /// Catalog search endpoint.
    #[serde(default = "default_catalog_url")]
    pub catalog_url: String,
    /// Download endpoint; files are fetched from `<download_url>/<id>`.
    #[serde(default = "default_download_url")]
    pub download_url: String,
    /// Public OAuth client id.
    #[serde(default = "default_client_id")]
    pub client_id: String,
    /// Catalog search page size.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Request timeout in seconds (default: 60)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for CdseConfig {
    fn default() -> Self {
        Self {
            token_url: default_token_url(),
            sessions_url: default_sessions_url(),
            catalog_url: default_catalog_url(),
            download_url: default_download_url(),
            client_id: default_client_id(),
            page_size: default_page_size(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_token_url() -> String {
    "https://identity.dataspace.copernicus.eu/auth/realms/CDSE/protocol/openid-connect/token"
        .to_string()
}

fn default_sessions_url() -> String {
    "https://identity.dataspace.copernicus.eu/auth/realms/CDSE/account/sessions".to_string()
}

fn default_catalog_url() -> String {
    "https://catalogue.dataspace.copernicus.eu/resto/api/collections/Sentinel1/search.json"
        .to_string()
}

fn default_download_url() -> String {
    "https://zipper.dataspace.copernicus.eu/download".to_string()
}

fn default_client_id() -> String {
    "cdse-public".to_string()
}

fn default_page_size() -> u32 {
    1000
}

fn default_timeout() -> u32 {
    60
}

/// CDSE API client.
pub struct CdseClient {
    client: Client,
    config: CdseConfig,
}

impl CdseClient {
    pub fn new(config: CdseConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        Ok(Self { client, config })
    }

    async fn fetch(&self, id: &str, token: &str) -> Result<Bytes, FetchError> {
        let url = format!("{}/{}", self.config.download_url.trim_end_matches('/'), id);
        debug!(id, "CDSE download");

        let response = self.client.get(&url).bearer_auth(token).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Download {
                id: id.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.bytes().await?)
    }
}

#[async_trait]
impl UpstreamCatalog for CdseClient {
    async fn search_page(
        &self,
        orbit_type: OrbitType,
        page: u32,
    ) -> Result<Vec<UpstreamOrbit>, ListingError> {
        debug!(orbit_type = %orbit_type, page, "CDSE catalog search");

        let response = self
            .client
            .get(&self.config.catalog_url)
            .query(&[
                ("productType", orbit_type.namespace().to_string()),
                ("maxRecords", self.config.page_size.to_string()),
                ("page", page.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ListingError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let search: SearchResponse = response.json().await.map_err(|e| {
            ListingError::Parse(format!("Failed to parse catalog search response: {}", e))
        })?;

        Ok(search
            .features
            .into_iter()
            .map(|f| UpstreamOrbit {
                filename: f.properties.title,
                id: f.id,
            })
            .collect())
    }

    async fn download(&self, id: &str, token: &str) -> Result<Bytes, FetchError> {
        let start = Instant::now();
        let result = self.fetch(id, token).await;

        let label = if result.is_ok() { "success" } else { "failed" };
        metrics::DOWNLOAD_DURATION
            .with_label_values(&[label])
            .observe(start.elapsed().as_secs_f64());

        result
    }
}

#[async_trait]
impl SessionApi for CdseClient {
    async fn create_session(&self, credentials: &Credentials) -> Result<AuthSession, AuthError> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("grant_type", "password"),
            ("username", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
        ];

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::TokenRejected {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Parse(e.to_string()))?;

        Ok(AuthSession {
            token: token.access_token,
            session_id: token.session_state,
        })
    }

    async fn revoke_session(&self, session: &AuthSession) -> Result<(), AuthError> {
        let url = format!(
            "{}/{}",
            self.config.sessions_url.trim_end_matches('/'),
            session.session_id
        );

        let response = self
            .client
            .delete(&url)
            .bearer_auth(&session.token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::RevokeRejected {
                session_id: session.session_id.clone(),
                status: status.as_u16(),
            });
        }

        Ok(())
    }
}

// ============================================================================
// CDSE API response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    id: String,
    properties: FeatureProperties,
}

#[derive(Debug, Deserialize)]
struct FeatureProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    session_state: String,
}
