//! Result payloads returned by the file-management operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a successful rename. The orchestrator only returns this
/// once the store state is consistent with `new_key`.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RenameResult {
    pub success: bool,
    pub old_key: String,
    pub new_key: String,
}

/// One failed item of a bulk delete.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BulkFailure {
    pub key: String,
    pub error: String,
}

/// Per-item outcome of a bulk delete. The batch as a whole never fails;
/// callers inspect `failed` to find out what went wrong.
///
/// Invariant: `successful.len() + failed.len()` equals the number of
/// requested keys.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct BulkResult {
    pub successful: Vec<String>,
    pub failed: Vec<BulkFailure>,
}

/// Metadata returned by the store after a put.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UploadResult {
    pub key: String,
    pub etag: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// A presigned download URL with its expiry instant.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct FileUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}
