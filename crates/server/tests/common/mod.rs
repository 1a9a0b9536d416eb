//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! backed by an in-memory object store, so routes can be exercised without
//! S3.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use orbits_core::{
    load_config_from_str, listing::CatalogListing, storage::ObjectStore, testing::MockObjectStore,
    OrbitResolver,
};

/// Re-export fixtures for test convenience
pub use orbits_core::testing::fixtures;

pub const BUCKET: &str = "s1-orbits";

/// Test fixture for API testing with a mock bucket.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_redirect() {
///     let fixture = TestFixture::new();
///     fixture.add_object(KEY).await;
///
///     let response = fixture.get("/S1A_IW_GRDH_...").await;
///     assert_eq!(response.status, 302);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock bucket - add orbit files here
    pub store: Arc<MockObjectStore>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub text: String,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with default settings.
    pub fn new() -> Self {
        Self::with_config_toml("")
    }

    /// Create a test fixture with extra TOML appended to the base config.
    pub fn with_config_toml(extra: &str) -> Self {
        Self::with_sections("", extra)
    }

    /// Create a test fixture with extra `[storage]` keys and extra sections.
    pub fn with_sections(storage_extra: &str, extra: &str) -> Self {
        let toml = format!(
            r#"
[server]
host = "127.0.0.1"
port = 8080

[storage]
bucket = "{}"
{}

[upstream]
username = "me"
password = "hunter2"

{}
"#,
            BUCKET, storage_extra, extra
        );
        let config = load_config_from_str(&toml).expect("valid test config");

        let store = Arc::new(MockObjectStore::new());
        let listing = CatalogListing::new(
            Arc::clone(&store) as Arc<dyn ObjectStore>,
            Duration::from_secs(config.resolver.listing_ttl_secs),
            config.resolver.listing_cache_capacity,
        );
        let resolver = Arc::new(OrbitResolver::new(
            Arc::new(listing),
            config.resolver_options(),
        ));

        let state = Arc::new(orbits_server::state::AppState::new(config, resolver));
        let router = orbits_server::api::create_router(state);

        Self { router, store }
    }

    /// Put an (empty) object into the mock bucket.
    pub async fn add_object(&self, key: &str) {
        self.store.insert(BUCKET, key, "").await;
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).to_string();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            text,
            body,
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status, $response.status, $response.text
        );
    };
}
