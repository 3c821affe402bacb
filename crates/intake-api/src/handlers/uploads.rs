//! Direct multipart uploads to local disk
//!
//! The first part carrying a file name is streamed under the same key layout used for
//! presigned uploads; remaining parts are ignored.

use crate::error::{ErrorResponse, HttpAppError};
use crate::response::ApiResponse;
use crate::state::AppState;
use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    response::IntoResponse,
};
use futures::TryStreamExt;
use intake_core::models::FileUploadResponse;
use intake_core::AppError;
use intake_storage::{resolve_key, FileType};
use std::sync::Arc;
use tokio_util::io::StreamReader;

fn invalid_multipart() -> AppError {
    AppError::InvalidInput("Invalid multipart form data".to_string())
}

/// Upload a plate document for a company registration
#[utoipa::path(
    post,
    path = "/registers/company/{id}/plates/{plateNumber}",
    tag = "uploads",
    params(
        ("id" = String, Path, description = "Registration ID"),
        ("plateNumber" = String, Path, description = "Plate the document belongs to")
    ),
    request_body(content_type = "multipart/form-data", description = "One file part"),
    responses(
        (status = 200, description = "File stored", body = ApiResponse<FileUploadResponse>),
        (status = 400, description = "Invalid multipart body or no file part", body = ErrorResponse),
        (status = 500, description = "Failed to write the file", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart))]
pub async fn upload_plate_file(
    State(state): State<Arc<AppState>>,
    Path((id, plate_number)): Path<(String, String)>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, HttpAppError> {
    let stored = store_first_file(&state, &id, FileType::Plate, Some(&plate_number), multipart).await?;
    Ok(ApiResponse::ok("Plate file uploaded successfully", stored))
}

/// Upload a general document for a company registration
#[utoipa::path(
    post,
    path = "/registers/company/{id}/general",
    tag = "uploads",
    params(("id" = String, Path, description = "Registration ID")),
    request_body(content_type = "multipart/form-data", description = "One file part"),
    responses(
        (status = 200, description = "File stored", body = ApiResponse<FileUploadResponse>),
        (status = 400, description = "Invalid multipart body or no file part", body = ErrorResponse),
        (status = 500, description = "Failed to write the file", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart))]
pub async fn upload_general_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, HttpAppError> {
    let stored = store_first_file(&state, &id, FileType::General, None, multipart).await?;
    Ok(ApiResponse::ok("General file uploaded successfully", stored))
}

async fn store_first_file(
    state: &AppState,
    registration_id: &str,
    file_type: FileType,
    plate_number: Option<&str>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<FileUploadResponse, HttpAppError> {
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!(error = %e, "Multipart body rejected");
        invalid_multipart()
    })?;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::debug!(error = %e, "Failed to read multipart field");
        invalid_multipart()
    })? {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };

        let key = resolve_key(registration_id, file_type, &file_name, None, plate_number)?;
        let mut reader = StreamReader::new(Box::pin(field.map_err(std::io::Error::other)));
        let stored = state.local_storage.upload_stream(&key, &mut reader).await?;

        tracing::info!(
            key = %stored.key,
            bytes = stored.size_bytes,
            "Multipart file stored"
        );

        return Ok(FileUploadResponse {
            status: "success".to_string(),
            filename: file_name,
            bytes: stored.size_bytes,
            saved_path: stored.location,
            project_id: registration_id.to_string(),
        });
    }

    Err(AppError::InvalidInput("No file parts found".to_string()).into())
}
