//! HTTP handlers for the file-management endpoints.
//! Thin layer: decodes requests, delegates to `FileService`, maps the
//! core's errors onto HTTP statuses via `AppError`.

use crate::{
    errors::AppError,
    models::{
        entry::FileEntry,
        results::{BulkResult, FileUrl, RenameResult, UploadResult},
    },
    services::file_service::FileService,
};
use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};

/// Query params for the browse listing.
#[derive(Debug, Deserialize)]
pub struct ListFilesQuery {
    pub prefix: Option<String>,
    pub limit: Option<usize>,
    pub marker: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListFilesResponse {
    pub files: Vec<FileEntry>,
    pub next_marker: Option<String>,
    pub truncated: bool,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct RenameReq {
    pub old_key: String,
    pub new_key: String,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteReq {
    pub keys: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateFolderReq {
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub prefix: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FileUrlQuery {
    pub key: String,
    #[serde(rename = "expires-in")]
    pub expires_in: Option<u64>,
}

/// GET `/files/{bucket}` — browse listing with opaque paging markers.
pub async fn list_files(
    State(service): State<FileService>,
    Path(bucket): Path<String>,
    Query(q): Query<ListFilesQuery>,
) -> Result<Json<ListFilesResponse>, AppError> {
    let prefix = q.prefix.unwrap_or_default();
    let limit = q.limit.unwrap_or(1000).clamp(1, 1000);
    let marker = q.marker.as_deref().map(decode_marker);

    let listing = service
        .list_files(&bucket, &prefix, limit, marker.as_deref())
        .await?;

    Ok(Json(ListFilesResponse {
        files: listing.files,
        next_marker: listing.next_marker.as_deref().map(encode_marker),
        truncated: listing.truncated,
        count: listing.count,
    }))
}

/// POST `/files/{bucket}/rename` — rename a file or folder.
pub async fn rename_file(
    State(service): State<FileService>,
    Path(bucket): Path<String>,
    Json(req): Json<RenameReq>,
) -> Result<Json<RenameResult>, AppError> {
    let result = service
        .rename_file(&bucket, &req.old_key, &req.new_key)
        .await?;
    Ok(Json(result))
}

/// POST `/files/{bucket}/delete` — bulk delete.
///
/// Always 200: per-item failures are data in the response body, not an
/// HTTP error, even when every item failed.
pub async fn delete_files(
    State(service): State<FileService>,
    Path(bucket): Path<String>,
    Json(req): Json<BulkDeleteReq>,
) -> Json<BulkResult> {
    Json(service.delete_files_bulk(&bucket, &req.keys).await)
}

/// POST `/files/{bucket}/folders` — create a folder marker.
pub async fn create_folder(
    State(service): State<FileService>,
    Path(bucket): Path<String>,
    Json(req): Json<CreateFolderReq>,
) -> Result<impl IntoResponse, AppError> {
    let result = service.create_folder(&bucket, &req.path).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// POST `/files/{bucket}/upload` — multipart upload, one stored object
/// per file part. An optional `prefix` query nests the uploads.
pub async fn upload_files(
    State(service): State<FileService>,
    Path(bucket): Path<String>,
    Query(q): Query<UploadQuery>,
    mut multipart: Multipart,
) -> Result<Json<Vec<UploadResult>>, AppError> {
    let mut uploaded = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(format!("malformed multipart body: {err}")))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|err| AppError::bad_request(format!("failed reading upload part: {err}")))?;

        let path = match q.prefix.as_deref() {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}/{filename}"),
            _ => filename,
        };
        uploaded.push(
            service
                .upload(&bucket, &path, data, &content_type, None)
                .await?,
        );
    }

    if uploaded.is_empty() {
        return Err(AppError::bad_request("no file parts in upload"));
    }
    Ok(Json(uploaded))
}

/// GET `/files/{bucket}/url` — presigned download URL.
pub async fn file_url(
    State(service): State<FileService>,
    Path(bucket): Path<String>,
    Query(q): Query<FileUrlQuery>,
) -> Result<Json<FileUrl>, AppError> {
    let url = service.file_url(&bucket, &q.key, q.expires_in).await?;
    Ok(Json(url))
}

fn encode_marker(marker: &str) -> String {
    general_purpose::STANDARD.encode(marker)
}

fn decode_marker(marker: &str) -> String {
    general_purpose::STANDARD
        .decode(marker)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| marker.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_tokens_round_trip() {
        let marker = "tenant/photos/2026/img-0042.jpg";
        assert_eq!(decode_marker(&encode_marker(marker)), marker);
    }

    #[test]
    fn undecodable_marker_passes_through() {
        assert_eq!(decode_marker("not base64!!"), "not base64!!");
    }
}
