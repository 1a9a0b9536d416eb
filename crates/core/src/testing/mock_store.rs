//! Mock object store for testing.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::storage::{ListPage, ObjectStore, StorageError};

/// In-memory implementation of the ObjectStore trait.
///
/// Keys are kept sorted per bucket, so listings come back in ascending
/// order the way S3 returns them. Continuation tokens are plain offsets.
///
/// # Example
///
/// ```rust,ignore
/// use orbits_core::testing::MockObjectStore;
///
/// let store = MockObjectStore::new().with_page_size(2);
/// store.insert("bucket", "AUX_POEORB/S1A_...EOF", "").await;
///
/// // ... exercise code that lists the bucket ...
///
/// assert_eq!(store.listed_prefixes().await, vec!["AUX_POEORB/S1A"]);
/// ```
#[derive(Debug)]
pub struct MockObjectStore {
    /// Objects by bucket, then key.
    objects: Arc<RwLock<BTreeMap<String, BTreeMap<String, Bytes>>>>,
    /// Maximum keys per listing page.
    page_size: usize,
    /// Prefixes passed to `list_page`, in call order.
    list_calls: Arc<RwLock<Vec<String>>>,
    /// Keys written through `put`, in call order.
    puts: Arc<RwLock<Vec<String>>>,
    /// If set, the next operation of any kind fails with this error.
    next_error: Arc<RwLock<Option<StorageError>>>,
    /// If set, the next `put` fails with this error.
    next_put_error: Arc<RwLock<Option<StorageError>>>,
}

impl Default for MockObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockObjectStore {
    /// Create an empty store returning up to 1000 keys per page.
    pub fn new() -> Self {
        Self {
            objects: Arc::new(RwLock::new(BTreeMap::new())),
            page_size: 1000,
            list_calls: Arc::new(RwLock::new(Vec::new())),
            puts: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            next_put_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Limit listing pages to `page_size` keys.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Store an object directly, bypassing call recording.
    pub async fn insert(&self, bucket: &str, key: &str, body: impl Into<Bytes>) {
        self.objects
            .write()
            .await
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), body.into());
    }

    /// Read an object directly, bypassing call recording.
    pub async fn object(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.objects
            .read()
            .await
            .get(bucket)
            .and_then(|objects| objects.get(key).cloned())
    }

    /// All keys in a bucket, ascending.
    pub async fn keys(&self, bucket: &str) -> Vec<String> {
        self.objects
            .read()
            .await
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of `list_page` calls made.
    pub async fn list_calls(&self) -> usize {
        self.list_calls.read().await.len()
    }

    /// Prefixes listed, one entry per distinct consecutive listing.
    ///
    /// Follow-up pages of the same listing are collapsed.
    pub async fn listed_prefixes(&self) -> Vec<String> {
        let mut prefixes: Vec<String> = self.list_calls.read().await.clone();
        prefixes.dedup();
        prefixes
    }

    /// Keys written through `put`, in call order.
    pub async fn recorded_puts(&self) -> Vec<String> {
        self.puts.read().await.clone()
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: StorageError) {
        *self.next_error.write().await = Some(error);
    }

    /// Configure the next `put` to fail with the given error.
    pub async fn fail_next_put(&self, error: StorageError) {
        *self.next_put_error.write().await = Some(error);
    }

    /// Take the next error if set.
    async fn take_error(&self) -> Option<StorageError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation: Option<String>,
    ) -> Result<ListPage, StorageError> {
        self.list_calls.write().await.push(prefix.to_string());
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        let offset = match continuation {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| StorageError::Request(format!("bad continuation token: {}", token)))?,
            None => 0,
        };

        let objects = self.objects.read().await;
        let matching: Vec<String> = objects
            .get(bucket)
            .map(|objects| {
                objects
                    .keys()
                    .filter(|k| k.starts_with(prefix))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let end = (offset + self.page_size).min(matching.len());
        let keys = matching.get(offset..end).unwrap_or_default().to_vec();
        let continuation = (end < matching.len()).then(|| end.to_string());

        Ok(ListPage { keys, continuation })
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.object(bucket, key)
            .await
            .ok_or_else(|| StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    async fn put(&self, bucket: &str, key: &str, body: Bytes) -> Result<(), StorageError> {
        self.puts.write().await.push(key.to_string());
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        if let Some(err) = self.next_put_error.write().await.take() {
            return Err(err);
        }

        self.insert(bucket, key, body).await;
        Ok(())
    }
}
