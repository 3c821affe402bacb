use crate::error::ErrorResponse;
use crate::response::ApiResponse;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse};
use intake_core::models::ClientUploadConfig;
use std::sync::Arc;

/// Upload limits for the client widget
#[utoipa::path(
    get,
    path = "/config",
    tag = "config",
    responses(
        (status = 200, description = "Configuration retrieved", body = ApiResponse<ClientUploadConfig>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ApiResponse::ok(
        "Configuration retrieved successfully",
        state.config.client_upload().clone(),
    )
}
