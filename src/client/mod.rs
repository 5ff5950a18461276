//! Object-store client seam.
//!
//! The management core never speaks the store's wire protocol itself;
//! it composes the minimal capability set below. `MemoryStore` is the
//! bundled implementation used for local development and tests.

pub mod memory;

use crate::models::{
    entry::FileEntry,
    results::{FileUrl, UploadResult},
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use thiserror::Error;

/// One object as reported by a raw (no-delimiter) list page.
#[derive(Clone, Debug)]
pub struct RawObject {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub etag: String,
}

/// One page of a raw listing. `next_continuation_token` is `None` on
/// the final page.
#[derive(Debug)]
pub struct ListPage {
    pub entries: Vec<RawObject>,
    pub next_continuation_token: Option<String>,
}

/// One page of a browse listing as shown by the dashboard.
#[derive(Debug)]
pub struct FileListing {
    pub files: Vec<FileEntry>,
    pub next_marker: Option<String>,
    pub truncated: bool,
    pub count: usize,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object `{key}` not found in bucket `{bucket}`")]
    NotFound { bucket: String, key: String },
    #[error("{0}")]
    Other(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Minimal capability set the management core requires from an
/// S3-compatible store.
///
/// Assumptions the orchestration layer leans on: `delete_file` is
/// idempotent-safe, a single `copy_object` is atomic, and listings are
/// key-ordered within a page sequence. Timeouts and retries, if any,
/// belong to the implementation behind this trait.
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    /// Browse listing with a client-chosen page size and opaque marker.
    async fn list_files(
        &self,
        bucket: &str,
        prefix: &str,
        limit: usize,
        marker: Option<&str>,
    ) -> StoreResult<FileListing>;

    /// Raw no-delimiter listing used for recursive walks. Returns every
    /// object under `prefix`, folder markers included.
    async fn list_all_paged(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<&str>,
    ) -> StoreResult<ListPage>;

    async fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        content_type: &str,
        metadata: Option<BTreeMap<String, String>>,
    ) -> StoreResult<UploadResult>;

    async fn get_file_url(
        &self,
        bucket: &str,
        key: &str,
        expiry_secs: u64,
    ) -> StoreResult<FileUrl>;

    async fn delete_file(&self, bucket: &str, key: &str) -> StoreResult<()>;

    async fn copy_object(
        &self,
        bucket: &str,
        source_key: &str,
        dest_key: &str,
    ) -> StoreResult<()>;
}
