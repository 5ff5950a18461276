//! FileService — the file/folder management core sitting above an
//! `ObjectStoreClient`.
//!
//! The store has no native rename or recursive move, so folder renames
//! are orchestrated as copy-then-delete with a rollback ledger, and
//! bulk deletes collect per-key outcomes instead of aborting the batch.
//! The store remains the sole source of truth: nothing here caches the
//! file tree beyond the lifetime of one call.

use crate::client::{FileListing, ObjectStoreClient, StoreError};
use crate::models::{
    entry::FileEntry,
    results::{BulkFailure, BulkResult, FileUrl, RenameResult, UploadResult},
};
use crate::services::path::{InvalidPathError, sanitize_path};
use bytes::Bytes;
use futures::future;
use std::{collections::BTreeMap, sync::Arc};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// Content type used for zero-byte folder-marker objects.
pub const FOLDER_CONTENT_TYPE: &str = "application/x-directory";

#[derive(Debug, Error)]
pub enum FileOpsError {
    #[error(transparent)]
    InvalidPath(#[from] InvalidPathError),
    #[error("rename failed: could not copy `{key}`: {source}")]
    RenameFailed { key: String, source: StoreError },
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type FileOpsResult<T> = Result<T, FileOpsError>;

/// Orchestrates file management operations over an object-store client.
///
/// Holds no state of its own beyond the client handle and the default
/// presigned-URL expiry; every operation rebuilds its view of the
/// bucket from fresh listings.
#[derive(Clone)]
pub struct FileService {
    client: Arc<dyn ObjectStoreClient>,
    url_expiry_secs: u64,
}

impl FileService {
    pub fn new(client: Arc<dyn ObjectStoreClient>, url_expiry_secs: u64) -> Self {
        Self {
            client,
            url_expiry_secs,
        }
    }

    /// Browse listing passthrough for the dashboard's file browser.
    pub async fn list_files(
        &self,
        bucket: &str,
        prefix: &str,
        limit: usize,
        marker: Option<&str>,
    ) -> FileOpsResult<FileListing> {
        Ok(self.client.list_files(bucket, prefix, limit, marker).await?)
    }

    /// Enumerate every real file object under `prefix`, descending into
    /// all nested folders.
    ///
    /// The prefix's own marker and nested folder markers are excluded:
    /// rename copies file content, and intermediate folders reappear
    /// implicitly once any file exists under them. A failed page aborts
    /// the whole listing; partial results are never returned.
    pub async fn list_all_files(&self, bucket: &str, prefix: &str) -> FileOpsResult<Vec<FileEntry>> {
        let mut files = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let page = self
                .client
                .list_all_paged(bucket, prefix, token.as_deref())
                .await?;
            for obj in page.entries {
                if obj.key == prefix || obj.key.ends_with('/') {
                    continue;
                }
                files.push(FileEntry::from_raw(
                    obj.key,
                    obj.size,
                    obj.last_modified,
                    obj.etag,
                ));
            }
            match page.next_continuation_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        Ok(files)
    }

    /// Rename a file or folder. `old_key` ending in `/` means folder;
    /// that is a convention, not a store attribute.
    ///
    /// The user-supplied destination is sanitized here; `old_key` comes
    /// from a previous listing and is used as-is. On failure the
    /// destination tree is rolled back and the source is untouched.
    pub async fn rename_file(
        &self,
        bucket: &str,
        old_key: &str,
        new_key: &str,
    ) -> FileOpsResult<RenameResult> {
        let is_folder = old_key.ends_with('/');
        let mut new_key = sanitize_path(new_key)?;
        if is_folder && !new_key.ends_with('/') {
            new_key.push('/');
        }

        // A same-key rename is already consistent; copy-then-delete
        // would overwrite the object with itself and then remove it.
        if new_key == old_key {
            debug!("rename `{}`: destination equals source, nothing to do", old_key);
            return Ok(RenameResult {
                success: true,
                old_key: old_key.to_string(),
                new_key,
            });
        }

        if is_folder {
            self.rename_folder(bucket, old_key, &new_key).await?;
        } else {
            self.rename_single(bucket, old_key, &new_key).await?;
        }

        Ok(RenameResult {
            success: true,
            old_key: old_key.to_string(),
            new_key,
        })
    }

    /// File rename: one atomic copy, then delete of the source.
    ///
    /// No rollback is needed. A failed copy leaves the source untouched;
    /// a failed delete after a successful copy leaves a duplicate, which
    /// is the accepted inconsistency window for single files.
    async fn rename_single(&self, bucket: &str, old_key: &str, new_key: &str) -> FileOpsResult<()> {
        self.client
            .copy_object(bucket, old_key, new_key)
            .await
            .map_err(|source| FileOpsError::RenameFailed {
                key: old_key.to_string(),
                source,
            })?;

        if let Err(err) = self.client.delete_file(bucket, old_key).await {
            warn!(
                "rename `{}` -> `{}`: source delete failed, duplicate left behind: {}",
                old_key, new_key, err
            );
        }
        Ok(())
    }

    /// Folder rename: enumerate, copy everything, then delete sources.
    async fn rename_folder(&self, bucket: &str, old_key: &str, new_key: &str) -> FileOpsResult<()> {
        let op = Uuid::new_v4();
        let source_files = self.list_all_files(bucket, old_key).await?;

        if source_files.is_empty() {
            debug!(%op, "renaming empty folder `{}` -> `{}`", old_key, new_key);
            self.client
                .upload_file(bucket, new_key, Bytes::new(), FOLDER_CONTENT_TYPE, None)
                .await?;
        } else {
            debug!(
                %op,
                "renaming folder `{}` -> `{}` ({} files)",
                old_key,
                new_key,
                source_files.len()
            );

            // Copies run one at a time so the ledger of completed copies
            // stays exact; a mid-copy failure rolls back precisely that
            // set. Concurrent copies would make the rollback set
            // ambiguous under partial completion.
            let mut copied_files: Vec<String> = Vec::with_capacity(source_files.len());
            for file in &source_files {
                let relative = &file.key[old_key.len()..];
                let dest_key = format!("{new_key}{relative}");
                if let Err(source) = self.client.copy_object(bucket, &file.key, &dest_key).await {
                    self.rollback_copies(bucket, &copied_files, op).await;
                    return Err(FileOpsError::RenameFailed {
                        key: file.key.clone(),
                        source,
                    });
                }
                copied_files.push(dest_key);
            }

            // Every copy landed; only now do the originals go away.
            // Between the two phases the content exists under both
            // prefixes, never under neither.
            for file in &source_files {
                match self.client.delete_file(bucket, &file.key).await {
                    Ok(()) => {}
                    Err(err) => warn!(
                        %op,
                        "source delete of `{}` failed after copy phase: {}", file.key, err
                    ),
                }
            }
        }

        // The old marker may never have existed; folders are often
        // materialized purely by their children. Cleanup failures here
        // are soft.
        match self.client.delete_file(bucket, old_key).await {
            Ok(()) => {}
            Err(err) if err.is_not_found() => {}
            Err(err) => warn!(%op, "stale marker delete of `{}` failed: {}", old_key, err),
        }

        Ok(())
    }

    /// Best-effort removal of destination keys created before a failed
    /// copy. Secondary failures are logged and swallowed; the original
    /// copy error is the one the caller needs.
    async fn rollback_copies(&self, bucket: &str, copied_files: &[String], op: Uuid) {
        for dest_key in copied_files {
            if let Err(err) = self.client.delete_file(bucket, dest_key).await {
                warn!(%op, "rollback delete of `{}` failed: {}", dest_key, err);
            }
        }
    }

    /// Delete a set of keys concurrently, capturing each outcome
    /// independently. The batch never aborts and never returns an
    /// error; one failing delete has zero effect on the others.
    pub async fn delete_files_bulk(&self, bucket: &str, keys: &[String]) -> BulkResult {
        let deletes = keys.iter().map(|key| {
            let key = key.clone();
            async move {
                let outcome = self.client.delete_file(bucket, &key).await;
                (key, outcome)
            }
        });
        let settled = future::join_all(deletes).await;

        let mut result = BulkResult::default();
        for (key, outcome) in settled {
            match outcome {
                Ok(()) => result.successful.push(key),
                Err(err) => result.failed.push(BulkFailure {
                    key,
                    error: err.to_string(),
                }),
            }
        }
        result
    }

    /// Materialize an empty folder: a zero-byte object at the
    /// sanitized path with exactly one trailing `/`. No pre-existence
    /// check; creating a folder that already has children is a no-op in
    /// effect.
    pub async fn create_folder(&self, bucket: &str, folder_path: &str) -> FileOpsResult<UploadResult> {
        let mut key = sanitize_path(folder_path)?;
        if !key.ends_with('/') {
            key.push('/');
        }
        Ok(self
            .client
            .upload_file(bucket, &key, Bytes::new(), FOLDER_CONTENT_TYPE, None)
            .await?)
    }

    /// Upload a file at a user-supplied path.
    pub async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Bytes,
        content_type: &str,
        metadata: Option<BTreeMap<String, String>>,
    ) -> FileOpsResult<UploadResult> {
        let key = sanitize_path(path)?;
        Ok(self
            .client
            .upload_file(bucket, &key, bytes, content_type, metadata)
            .await?)
    }

    /// Presigned download URL, with the configured default expiry.
    pub async fn file_url(
        &self,
        bucket: &str,
        key: &str,
        expiry_secs: Option<u64>,
    ) -> FileOpsResult<FileUrl> {
        let expiry = expiry_secs.unwrap_or(self.url_expiry_secs);
        Ok(self.client.get_file_url(bucket, key, expiry).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::memory::MemoryStore;

    const BUCKET: &str = "tenant-media";

    async fn seed(store: &MemoryStore, keys: &[&str]) {
        for key in keys {
            let bytes = if key.ends_with('/') {
                Bytes::new()
            } else {
                Bytes::from(format!("contents of {key}"))
            };
            let content_type = if key.ends_with('/') {
                FOLDER_CONTENT_TYPE
            } else {
                "text/plain"
            };
            store
                .upload_file(BUCKET, key, bytes, content_type, None)
                .await
                .unwrap();
        }
    }

    fn service(store: &Arc<MemoryStore>) -> FileService {
        FileService::new(store.clone(), 900)
    }

    #[tokio::test]
    async fn file_rename_is_copy_then_delete() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, &["x.txt"]).await;
        let svc = service(&store);

        let result = svc.rename_file(BUCKET, "x.txt", "y.txt").await.unwrap();
        assert!(result.success);
        assert_eq!(result.new_key, "y.txt");
        assert!(store.has_object(BUCKET, "y.txt").await);
        assert!(!store.has_object(BUCKET, "x.txt").await);
    }

    #[tokio::test]
    async fn file_rename_of_missing_source_fails_hard() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);

        let err = svc.rename_file(BUCKET, "ghost.txt", "y.txt").await.unwrap_err();
        assert!(matches!(err, FileOpsError::RenameFailed { ref key, .. } if key == "ghost.txt"));
    }

    #[tokio::test]
    async fn file_rename_to_same_key_leaves_object_in_place() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, &["x.txt"]).await;
        let svc = service(&store);

        let result = svc.rename_file(BUCKET, "x.txt", "x.txt").await.unwrap();
        assert!(result.success);
        assert_eq!(result.new_key, "x.txt");
        assert!(store.has_object(BUCKET, "x.txt").await);
    }

    #[tokio::test]
    async fn folder_rename_to_same_key_leaves_files_in_place() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, &["p/", "p/a.txt", "p/sub/b.txt"]).await;
        let svc = service(&store);

        // With and without the trailing slash on the destination.
        for dest in ["p/", "p"] {
            let result = svc.rename_file(BUCKET, "p/", dest).await.unwrap();
            assert_eq!(result.new_key, "p/");
            for key in ["p/", "p/a.txt", "p/sub/b.txt"] {
                assert!(store.has_object(BUCKET, key).await, "{key} should survive");
            }
        }
    }

    #[tokio::test]
    async fn file_rename_succeeds_when_source_delete_fails() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, &["x.txt"]).await;
        store.fail_deletes_of("x.txt").await;
        let svc = service(&store);

        // The copy landed, so the call succeeds; the undeletable source
        // stays behind as a duplicate.
        let result = svc.rename_file(BUCKET, "x.txt", "y.txt").await.unwrap();
        assert!(result.success);
        assert!(store.has_object(BUCKET, "y.txt").await);
        assert!(store.has_object(BUCKET, "x.txt").await);
    }

    #[tokio::test]
    async fn empty_folder_rename_just_moves_the_marker() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, &["empty/"]).await;
        let svc = service(&store);

        svc.rename_file(BUCKET, "empty/", "renamed/").await.unwrap();
        assert!(store.has_object(BUCKET, "renamed/").await);
        assert!(!store.has_object(BUCKET, "empty/").await);
        assert_eq!(
            store.content_type_of(BUCKET, "renamed/").await.as_deref(),
            Some(FOLDER_CONTENT_TYPE)
        );
    }

    #[tokio::test]
    async fn folder_rename_moves_nested_files_and_drops_sources() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, &["docs/", "docs/a.txt", "docs/sub/b.txt"]).await;
        let svc = service(&store);

        // Destination without the trailing slash; the orchestrator
        // restores the folder convention.
        let result = svc.rename_file(BUCKET, "docs/", "archive").await.unwrap();
        assert_eq!(result.new_key, "archive/");

        assert!(store.has_object(BUCKET, "archive/a.txt").await);
        assert!(store.has_object(BUCKET, "archive/sub/b.txt").await);
        assert_eq!(store.object_keys(BUCKET).await.iter().filter(|k| k.starts_with("docs/")).count(), 0);
    }

    #[tokio::test]
    async fn folder_rename_rolls_back_on_mid_copy_failure() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, &["p/", "p/a", "p/b", "p/c"]).await;
        store.fail_copies_to("q/b").await;
        let svc = service(&store);

        let err = svc.rename_file(BUCKET, "p/", "q/").await.unwrap_err();
        assert!(matches!(err, FileOpsError::RenameFailed { ref key, .. } if key == "p/b"));

        // Destination prefix fully rolled back.
        for dest in ["q/a", "q/b", "q/c", "q/"] {
            assert!(!store.has_object(BUCKET, dest).await, "{dest} should not exist");
        }
        // Source untouched, marker included: no source delete may happen
        // before every copy has succeeded.
        for src in ["p/", "p/a", "p/b", "p/c"] {
            assert!(store.has_object(BUCKET, src).await, "{src} should survive");
        }
    }

    #[tokio::test]
    async fn folder_rename_tolerates_missing_marker() {
        let store = Arc::new(MemoryStore::new());
        // Folder materialized purely by its children.
        seed(&store, &["logs/2026/app.log"]).await;
        let svc = service(&store);

        svc.rename_file(BUCKET, "logs/", "history/").await.unwrap();
        assert!(store.has_object(BUCKET, "history/2026/app.log").await);
        assert!(!store.has_object(BUCKET, "logs/2026/app.log").await);
    }

    #[tokio::test]
    async fn rename_rejects_traversal_destination() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, &["a.txt"]).await;
        let svc = service(&store);

        let err = svc.rename_file(BUCKET, "a.txt", "../escape.txt").await.unwrap_err();
        assert!(matches!(err, FileOpsError::InvalidPath(_)));
        assert!(store.has_object(BUCKET, "a.txt").await);
    }

    #[tokio::test]
    async fn bulk_delete_is_partial_failure_tolerant() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, &["k1", "k2", "k3"]).await;
        store.fail_deletes_of("k2").await;
        let svc = service(&store);

        let keys: Vec<String> = ["k1", "k2", "k3"].iter().map(|k| k.to_string()).collect();
        let result = svc.delete_files_bulk(BUCKET, &keys).await;

        assert_eq!(result.successful, vec!["k1", "k3"]);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].key, "k2");
        assert!(!result.failed[0].error.is_empty());
        assert_eq!(result.successful.len() + result.failed.len(), keys.len());
    }

    #[tokio::test]
    async fn bulk_delete_reports_missing_keys_as_failures() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, &["real"]).await;
        let svc = service(&store);

        let keys = vec!["real".to_string(), "phantom".to_string()];
        let result = svc.delete_files_bulk(BUCKET, &keys).await;
        assert_eq!(result.successful, vec!["real"]);
        assert_eq!(result.failed[0].key, "phantom");
        assert_eq!(result.successful.len() + result.failed.len(), keys.len());
    }

    #[tokio::test]
    async fn bulk_delete_of_nothing_is_empty() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);

        let result = svc.delete_files_bulk(BUCKET, &[]).await;
        assert!(result.successful.is_empty());
        assert!(result.failed.is_empty());
    }

    #[tokio::test]
    async fn recursive_listing_excludes_folder_markers() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, &["p/", "p/a.txt", "p/sub/", "p/sub/b.txt"]).await;
        let svc = service(&store);

        let files = svc.list_all_files(BUCKET, "p/").await.unwrap();
        let keys: Vec<&str> = files.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["p/a.txt", "p/sub/b.txt"]);
        assert!(files.iter().all(|f| !f.is_folder));
    }

    #[tokio::test]
    async fn recursive_listing_spans_pages() {
        let store = Arc::new(MemoryStore::with_page_size(2));
        seed(
            &store,
            &["big/", "big/1", "big/2", "big/3", "big/4", "big/5"],
        )
        .await;
        let svc = service(&store);

        let files = svc.list_all_files(BUCKET, "big/").await.unwrap();
        assert_eq!(files.len(), 5);
    }

    #[tokio::test]
    async fn create_folder_uploads_a_marker() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);

        let result = svc.create_folder(BUCKET, "reports/2026").await.unwrap();
        assert_eq!(result.key, "reports/2026/");
        assert_eq!(result.size, 0);
        assert_eq!(
            store.content_type_of(BUCKET, "reports/2026/").await.as_deref(),
            Some(FOLDER_CONTENT_TYPE)
        );
    }

    #[tokio::test]
    async fn upload_sanitizes_the_path() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);

        let result = svc
            .upload(BUCKET, "//inbox\\scan.pdf", Bytes::from_static(b"%PDF"), "application/pdf", None)
            .await
            .unwrap();
        assert_eq!(result.key, "inbox/scan.pdf");

        let err = svc
            .upload(BUCKET, "in:valid", Bytes::new(), "text/plain", None)
            .await
            .unwrap_err();
        assert!(matches!(err, FileOpsError::InvalidPath(_)));
    }
}
