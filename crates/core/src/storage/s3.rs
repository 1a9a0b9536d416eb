//! S3 object store backend.

use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ListPage, ObjectStore, StorageError};

/// Connection settings for the S3 backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct S3StoreConfig {
    /// AWS region; falls back to the default provider chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible stores (MinIO, LocalStack).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Path-style addressing, required by most S3-compatible stores.
    #[serde(default)]
    pub force_path_style: bool,
}

/// S3-backed object store.
#[derive(Clone)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    /// Build a client from the ambient AWS configuration plus overrides.
    pub async fn new(config: &S3StoreConfig) -> Self {
        let region_provider = match &config.region {
            Some(region) => RegionProviderChain::first_try(Region::new(region.clone())),
            None => RegionProviderChain::default_provider(),
        };
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&aws_config);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        if config.force_path_style {
            builder = builder.force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation: Option<String>,
    ) -> Result<ListPage, StorageError> {
        let mut request = self.client.list_objects_v2().bucket(bucket).prefix(prefix);
        if let Some(token) = continuation {
            request = request.continuation_token(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StorageError::Request(format!("list {}/{}: {}", bucket, prefix, e)))?;

        let keys = response
            .contents()
            .iter()
            .filter_map(|obj| obj.key().map(str::to_string))
            .collect();

        let continuation = if response.is_truncated().unwrap_or(false) {
            response.next_continuation_token().map(str::to_string)
        } else {
            None
        };

        Ok(ListPage { keys, continuation })
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let message = e.to_string();
                if message.contains("NoSuchKey") || message.contains("404") {
                    StorageError::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    }
                } else {
                    StorageError::Request(format!("get {}/{}: {}", bucket, key, message))
                }
            })?;

        let body = response.body.collect().await.map_err(|e| {
            StorageError::Request(format!("read body of {}/{}: {}", bucket, key, e))
        })?;

        Ok(body.into_bytes())
    }

    async fn put(&self, bucket: &str, key: &str, body: Bytes) -> Result<(), StorageError> {
        let size = body.len();
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| StorageError::Request(format!("put {}/{}: {}", bucket, key, e)))?;

        debug!(bucket, key, size, "Stored object");
        Ok(())
    }
}
