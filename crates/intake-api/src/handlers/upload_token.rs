use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::utils::ClientIp;
use axum::{extract::State, response::IntoResponse};
use chrono::Utc;
use intake_core::models::{UploadTokenRequest, UploadTokenResponse};
use intake_core::AppError;
use std::sync::Arc;

/// Exchange a CAPTCHA response for an upload token
#[utoipa::path(
    post,
    path = "/upload-token",
    tag = "uploads",
    request_body = UploadTokenRequest,
    responses(
        (status = 200, description = "Upload token issued", body = ApiResponse<UploadTokenResponse>),
        (status = 400, description = "Missing or rejected CAPTCHA token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request))]
pub async fn issue_upload_token(
    State(state): State<Arc<AppState>>,
    ClientIp(client_ip): ClientIp,
    ValidatedJson(request): ValidatedJson<UploadTokenRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let turnstile_token = request.turnstile_token.trim();
    if turnstile_token.is_empty() {
        return Err(AppError::InvalidInput("Turnstile token is required".to_string()).into());
    }

    if !state
        .captcha
        .verify(turnstile_token, client_ip.as_deref())
        .await
    {
        return Err(AppError::InvalidInput("Invalid Turnstile token".to_string()).into());
    }

    let issued = state.upload_tokens.issue(turnstile_token)?;
    let expires_in = (issued.expires_at - Utc::now()).num_seconds().max(0);

    tracing::info!(expires_in, "Upload token issued");

    Ok(ApiResponse::ok(
        "Upload token generated successfully",
        UploadTokenResponse {
            upload_token: issued.token,
            expires_in,
        },
    ))
}
