//! Presigned object storage URLs
//!
//! The PUT URL is only handed out behind the upload token gate. Download URLs need a key
//! that follows the upload layout.

use crate::error::{ErrorResponse, HttpAppError};
use crate::response::ApiResponse;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use intake_core::models::{
    DownloadUrlQuery, DownloadUrlResponse, PresignedUrlQuery, PresignedUrlResponse,
};
use intake_core::AppError;
use intake_storage::{parse_key, resolve_key, FileType};
use std::sync::Arc;
use std::time::Duration;

pub const PRESIGNED_URL_TTL: Duration = Duration::from_secs(15 * 60);
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Presigned PUT URL for one registration document
#[utoipa::path(
    get,
    path = "/presigned",
    tag = "uploads",
    params(PresignedUrlQuery),
    responses(
        (status = 200, description = "Presigned URL generated", body = ApiResponse<PresignedUrlResponse>),
        (status = 400, description = "Invalid fileType or missing parameter", body = ErrorResponse),
        (status = 401, description = "Missing or invalid upload token", body = ErrorResponse),
        (status = 500, description = "Storage not configured or signing failed", body = ErrorResponse)
    ),
    security(("upload_token" = []))
)]
#[tracing::instrument(
    skip(state, query),
    fields(register_id = ?query.register_id, file_type = ?query.file_type)
)]
pub async fn presigned_upload_url(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PresignedUrlQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let file_type: FileType = query.file_type.as_deref().unwrap_or_default().parse()?;
    let key = resolve_key(
        query.register_id.as_deref().unwrap_or_default(),
        file_type,
        query.file_name.as_deref().unwrap_or_default(),
        query.employer_id.as_deref(),
        query.plate_number.as_deref(),
    )?;

    let content_type = query
        .content_type
        .as_deref()
        .filter(|ct| !ct.is_empty())
        .unwrap_or(DEFAULT_CONTENT_TYPE);

    let url = state
        .signer()?
        .presigned_put_url(&key, content_type, PRESIGNED_URL_TTL)
        .await?;

    tracing::info!(key = %key, content_type, "Presigned upload URL generated");

    Ok(ApiResponse::ok(
        "Presigned URL generated successfully",
        PresignedUrlResponse { url, key },
    ))
}

/// Presigned GET URL for a previously uploaded document
#[utoipa::path(
    get,
    path = "/presigned/download",
    tag = "uploads",
    params(DownloadUrlQuery),
    responses(
        (status = 200, description = "Download URL generated", body = ApiResponse<DownloadUrlResponse>),
        (status = 400, description = "Missing or malformed key", body = ErrorResponse),
        (status = 500, description = "Storage not configured or signing failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, query), fields(key = ?query.key))]
pub async fn presigned_download_url(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DownloadUrlQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let key = query
        .key
        .filter(|key| !key.is_empty())
        .ok_or_else(|| AppError::InvalidInput("key is required".to_string()))?;
    let parsed = parse_key(&key)?;

    let download_url = state
        .signer()?
        .get_presigned_url(&key, PRESIGNED_URL_TTL)
        .await?;

    tracing::info!(
        register_id = parsed.registration_id,
        file_type = %parsed.file_type,
        file_name = parsed.file_name,
        "Presigned download URL generated"
    );

    Ok(ApiResponse::ok(
        "Download URL generated successfully",
        DownloadUrlResponse { download_url, key },
    ))
}
