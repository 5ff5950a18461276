//! In-memory `ObjectStoreClient` used for local development and tests.
//!
//! Objects live in a `BTreeMap` per bucket so listings come back in key
//! order, matching the ordering contract of a real S3-compatible store.
//! The store supports fault injection (failing copies or deletes of
//! chosen keys) so the orchestration tests can exercise partial-failure
//! paths.

use super::{FileListing, ListPage, ObjectStoreClient, RawObject, StoreError, StoreResult};
use crate::models::{
    entry::FileEntry,
    results::{FileUrl, UploadResult},
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::RwLock;

const DEFAULT_PAGE_SIZE: usize = 1000;

#[derive(Clone, Debug)]
struct StoredObject {
    bytes: Bytes,
    content_type: String,
    etag: String,
    last_modified: DateTime<Utc>,
    metadata: Option<BTreeMap<String, String>>,
}

/// Ordered in-memory object store.
pub struct MemoryStore {
    buckets: RwLock<HashMap<String, BTreeMap<String, StoredObject>>>,
    page_size: usize,
    fail_copy_dests: RwLock<HashSet<String>>,
    fail_delete_keys: RwLock<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Build a store that paginates raw listings at `page_size` keys.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            page_size: page_size.max(1),
            fail_copy_dests: RwLock::new(HashSet::new()),
            fail_delete_keys: RwLock::new(HashSet::new()),
        }
    }

    /// Fault injection: every copy whose destination is `dest_key`
    /// fails until cleared.
    pub async fn fail_copies_to(&self, dest_key: &str) {
        self.fail_copy_dests.write().await.insert(dest_key.into());
    }

    /// Fault injection: every delete of `key` fails until cleared.
    pub async fn fail_deletes_of(&self, key: &str) {
        self.fail_delete_keys.write().await.insert(key.into());
    }

    /// All keys currently stored in `bucket`, in order.
    pub async fn object_keys(&self, bucket: &str) -> Vec<String> {
        self.buckets
            .read()
            .await
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Content type recorded for a stored object, if present.
    pub async fn content_type_of(&self, bucket: &str, key: &str) -> Option<String> {
        self.buckets
            .read()
            .await
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .map(|obj| obj.content_type.clone())
    }

    /// User metadata recorded for a stored object, if present.
    pub async fn metadata_of(
        &self,
        bucket: &str,
        key: &str,
    ) -> Option<BTreeMap<String, String>> {
        self.buckets
            .read()
            .await
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .and_then(|obj| obj.metadata.clone())
    }

    pub async fn has_object(&self, bucket: &str, key: &str) -> bool {
        self.buckets
            .read()
            .await
            .get(bucket)
            .is_some_and(|objects| objects.contains_key(key))
    }

    fn not_found(bucket: &str, key: &str) -> StoreError {
        StoreError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStoreClient for MemoryStore {
    async fn list_files(
        &self,
        bucket: &str,
        prefix: &str,
        limit: usize,
        marker: Option<&str>,
    ) -> StoreResult<FileListing> {
        let buckets = self.buckets.read().await;
        let objects = buckets.get(bucket);

        let mut matched = objects
            .map(|objects| {
                objects
                    .iter()
                    .filter(|(key, _)| key.starts_with(prefix))
                    .filter(|(key, _)| marker.is_none_or(|m| key.as_str() > m))
                    .map(|(key, obj)| {
                        FileEntry::from_raw(
                            key.clone(),
                            obj.bytes.len() as u64,
                            obj.last_modified,
                            obj.etag.clone(),
                        )
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let limit = limit.max(1);
        let truncated = matched.len() > limit;
        matched.truncate(limit);
        let next_marker = if truncated {
            matched.last().map(|entry| entry.key.clone())
        } else {
            None
        };
        let count = matched.len();

        Ok(FileListing {
            files: matched,
            next_marker,
            truncated,
            count,
        })
    }

    async fn list_all_paged(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<&str>,
    ) -> StoreResult<ListPage> {
        let buckets = self.buckets.read().await;
        let objects = buckets.get(bucket);

        let mut matched = objects
            .map(|objects| {
                objects
                    .iter()
                    .filter(|(key, _)| key.starts_with(prefix))
                    .filter(|(key, _)| continuation_token.is_none_or(|t| key.as_str() > t))
                    .map(|(key, obj)| RawObject {
                        key: key.clone(),
                        size: obj.bytes.len() as u64,
                        last_modified: obj.last_modified,
                        etag: obj.etag.clone(),
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let has_more = matched.len() > self.page_size;
        matched.truncate(self.page_size);
        let next_continuation_token = if has_more {
            matched.last().map(|obj| obj.key.clone())
        } else {
            None
        };

        Ok(ListPage {
            entries: matched,
            next_continuation_token,
        })
    }

    async fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        content_type: &str,
        metadata: Option<BTreeMap<String, String>>,
    ) -> StoreResult<UploadResult> {
        let etag = format!("{:x}", md5::compute(&bytes));
        let last_modified = Utc::now();
        let size = bytes.len() as u64;

        let mut buckets = self.buckets.write().await;
        buckets.entry(bucket.to_string()).or_default().insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
                etag: etag.clone(),
                last_modified,
                metadata,
            },
        );

        Ok(UploadResult {
            key: key.to_string(),
            etag,
            size,
            last_modified,
        })
    }

    async fn get_file_url(
        &self,
        bucket: &str,
        key: &str,
        expiry_secs: u64,
    ) -> StoreResult<FileUrl> {
        let buckets = self.buckets.read().await;
        if !buckets
            .get(bucket)
            .is_some_and(|objects| objects.contains_key(key))
        {
            return Err(Self::not_found(bucket, key));
        }

        let expires_at = Utc::now() + Duration::seconds(expiry_secs as i64);
        Ok(FileUrl {
            url: format!("memory://{}/{}?expires={}", bucket, key, expires_at.timestamp()),
            expires_at,
        })
    }

    async fn delete_file(&self, bucket: &str, key: &str) -> StoreResult<()> {
        if self.fail_delete_keys.read().await.contains(key) {
            return Err(StoreError::Other(format!(
                "injected delete failure for `{}`",
                key
            )));
        }

        let mut buckets = self.buckets.write().await;
        let removed = buckets
            .get_mut(bucket)
            .and_then(|objects| objects.remove(key));
        match removed {
            Some(_) => Ok(()),
            None => Err(Self::not_found(bucket, key)),
        }
    }

    async fn copy_object(
        &self,
        bucket: &str,
        source_key: &str,
        dest_key: &str,
    ) -> StoreResult<()> {
        if self.fail_copy_dests.read().await.contains(dest_key) {
            return Err(StoreError::Other(format!(
                "injected copy failure for `{}`",
                dest_key
            )));
        }

        let mut buckets = self.buckets.write().await;
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| Self::not_found(bucket, source_key))?;
        let mut copy = objects
            .get(source_key)
            .cloned()
            .ok_or_else(|| Self::not_found(bucket, source_key))?;
        copy.last_modified = Utc::now();
        objects.insert(dest_key.to_string(), copy);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed(store: &MemoryStore, bucket: &str, keys: &[&str]) {
        for key in keys {
            store
                .upload_file(bucket, key, Bytes::from_static(b"data"), "text/plain", None)
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn raw_listing_paginates_in_key_order() {
        let store = MemoryStore::with_page_size(2);
        seed(&store, "b", &["p/a", "p/b", "p/c", "p/d", "q/other"]).await;

        let first = store.list_all_paged("b", "p/", None).await.unwrap();
        assert_eq!(
            first.entries.iter().map(|o| o.key.as_str()).collect::<Vec<_>>(),
            vec!["p/a", "p/b"]
        );
        let token = first.next_continuation_token.expect("more pages");

        let second = store.list_all_paged("b", "p/", Some(&token)).await.unwrap();
        assert_eq!(
            second
                .entries
                .iter()
                .map(|o| o.key.as_str())
                .collect::<Vec<_>>(),
            vec!["p/c", "p/d"]
        );
        assert!(second.next_continuation_token.is_none());
    }

    #[tokio::test]
    async fn browse_listing_reports_truncation_and_marker() {
        let store = MemoryStore::new();
        seed(&store, "b", &["x/1", "x/2", "x/3"]).await;

        let page = store.list_files("b", "x/", 2, None).await.unwrap();
        assert!(page.truncated);
        assert_eq!(page.count, 2);
        assert_eq!(page.next_marker.as_deref(), Some("x/2"));

        let rest = store.list_files("b", "x/", 2, Some("x/2")).await.unwrap();
        assert!(!rest.truncated);
        assert_eq!(rest.files[0].key, "x/3");
    }

    #[tokio::test]
    async fn upload_records_content_type_and_metadata() {
        let store = MemoryStore::new();
        let metadata = BTreeMap::from([("owner".to_string(), "ops".to_string())]);
        store
            .upload_file(
                "b",
                "report.csv",
                Bytes::from_static(b"a,b"),
                "text/csv",
                Some(metadata.clone()),
            )
            .await
            .unwrap();

        assert_eq!(
            store.content_type_of("b", "report.csv").await.as_deref(),
            Some("text/csv")
        );
        assert_eq!(store.metadata_of("b", "report.csv").await, Some(metadata));
    }

    #[tokio::test]
    async fn delete_of_missing_key_is_not_found() {
        let store = MemoryStore::new();
        let err = store.delete_file("b", "nope").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn copy_preserves_content_and_etag() {
        let store = MemoryStore::new();
        seed(&store, "b", &["src.txt"]).await;

        store.copy_object("b", "src.txt", "dst.txt").await.unwrap();
        let listing = store.list_files("b", "", 10, None).await.unwrap();
        let src = listing.files.iter().find(|f| f.key == "src.txt").unwrap();
        let dst = listing.files.iter().find(|f| f.key == "dst.txt").unwrap();
        assert_eq!(src.etag, dst.etag);
        assert_eq!(src.size, dst.size);
    }
}
