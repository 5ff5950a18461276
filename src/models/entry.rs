//! Listing entries as seen by the dashboard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single entry in a bucket listing.
///
/// Entries are derived from the store's list responses on every call;
/// nothing here is cached or persisted. A folder is purely a convention:
/// a zero-byte object whose key ends with `/`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FileEntry {
    /// Object key (path-like identifier within the bucket).
    pub key: String,

    /// Size in bytes.
    pub size: u64,

    /// Timestamp when the object was last modified.
    pub last_modified: DateTime<Utc>,

    /// Checksum reported by the store.
    pub etag: String,

    /// Whether this entry represents a folder marker.
    pub is_folder: bool,
}

impl FileEntry {
    /// Derive the folder flag from the key suffix.
    pub fn from_raw(key: String, size: u64, last_modified: DateTime<Utc>, etag: String) -> Self {
        let is_folder = key.ends_with('/');
        Self {
            key,
            size,
            last_modified,
            etag,
            is_folder,
        }
    }
}
