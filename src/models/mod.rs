//! Data model for the file-management core.
//!
//! These types are derived from object-store listings and operation
//! outcomes on every call; none of them are persisted. They serialize
//! naturally as JSON via `serde` for the dashboard API.

pub mod entry;
pub mod results;
