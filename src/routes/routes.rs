//! Defines routes for the file-management API.
//!
//! ## Structure
//! - **Health endpoints**
//!   - `GET  /healthz` — liveness
//!   - `GET  /readyz`  — readiness (store round-trip)
//!
//! - **File-management endpoints**
//!   - `GET  /files/{bucket}`         — browse listing (prefix, limit, marker)
//!   - `GET  /files/{bucket}/url`     — presigned download URL
//!   - `POST /files/{bucket}/upload`  — multipart upload
//!   - `POST /files/{bucket}/folders` — create folder marker
//!   - `POST /files/{bucket}/rename`  — rename file or folder
//!   - `POST /files/{bucket}/delete`  — bulk delete with per-item report

use crate::{
    handlers::{
        file_handlers::{
            create_folder, delete_files, file_url, list_files, rename_file, upload_files,
        },
        health_handlers::{healthz, readyz},
    },
    services::file_service::FileService,
};
use axum::{
    Router,
    routing::{get, post},
};

/// Build and return the router for the admin file-management API.
///
/// The router carries shared state (`FileService`) to all handlers.
pub fn routes() -> Router<FileService> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // file-management endpoints
        .route("/files/{bucket}", get(list_files))
        .route("/files/{bucket}/url", get(file_url))
        .route("/files/{bucket}/upload", post(upload_files))
        .route("/files/{bucket}/folders", post(create_folder))
        .route("/files/{bucket}/rename", post(rename_file))
        .route("/files/{bucket}/delete", post(delete_files))
}
