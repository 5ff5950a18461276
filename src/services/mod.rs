//! Orchestration layer: path sanitization and the file-management core.

pub mod file_service;
pub mod path;
