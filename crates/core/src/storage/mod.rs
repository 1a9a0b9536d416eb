//! Object storage abstraction.
//!
//! Orbit files are mirrored into a bucket-style key/value store. The
//! `ObjectStore` trait covers the three calls this crate needs; the S3
//! implementation lives in [`s3`].

mod s3;

pub use s3::{S3Store, S3StoreConfig};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

/// Errors from the object store backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Object does not exist.
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// Backend call failed.
    #[error("Storage request failed: {0}")]
    Request(String),
}

/// One page of a key listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub keys: Vec<String>,
    /// Token for the next page; `None` on the last page.
    pub continuation: Option<String>,
}

/// Bucket-style object store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List one page of keys under `prefix`.
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation: Option<String>,
    ) -> Result<ListPage, StorageError>;

    /// Read an object.
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError>;

    /// Write an object, replacing any existing one.
    async fn put(&self, bucket: &str, key: &str, body: Bytes) -> Result<(), StorageError>;
}

/// List every key under `prefix`, following continuation tokens until the
/// listing is exhausted. Keys are returned in the order the store yields them.
pub async fn list_all_keys(
    store: &dyn ObjectStore,
    bucket: &str,
    prefix: &str,
) -> Result<Vec<String>, StorageError> {
    let mut keys = Vec::new();
    let mut continuation = None;
    let mut pages = 0u32;

    loop {
        let page = store.list_page(bucket, prefix, continuation).await?;
        pages += 1;
        keys.extend(page.keys);
        match page.continuation {
            Some(token) => continuation = Some(token),
            None => break,
        }
    }

    debug!(bucket, prefix, pages, keys = keys.len(), "Listed objects");
    Ok(keys)
}
