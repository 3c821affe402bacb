//! Registration endpoints
//!
//! `POST /registers/{kind}` validates a form and hands out identifiers; the `finalize`
//! variants dispatch the normalized form to the registration backend and relay its reply.

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::response::ApiResponse;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse};
use intake_core::models::{
    CompanyFinalizeResponse, CompanyRegisterForm, CompanyRegisterResponse, RegisterIdResponse,
    RegistrationForm, ResidentFinalizeResponse, ResidentRegisterForm,
};
use std::sync::Arc;

/// Validate a resident form
#[utoipa::path(
    post,
    path = "/registers/resident",
    tag = "registers",
    request_body = ResidentRegisterForm,
    responses(
        (status = 200, description = "Form is valid", body = ApiResponse<RegisterIdResponse>),
        (status = 400, description = "Malformed body or invalid fields", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, form))]
pub async fn register_resident(
    State(state): State<Arc<AppState>>,
    ValidatedJson(form): ValidatedJson<ResidentRegisterForm>,
) -> Result<impl IntoResponse, HttpAppError> {
    let register_id = state.registrations.initiate_resident(form)?;

    Ok(ApiResponse::ok(
        "Resident registration form validated successfully",
        RegisterIdResponse { register_id },
    ))
}

/// Submit a resident registration to the backend
#[utoipa::path(
    post,
    path = "/registers/resident/finalize",
    tag = "registers",
    request_body = ResidentRegisterForm,
    responses(
        (status = 200, description = "Registration dispatched", body = ApiResponse<ResidentFinalizeResponse>),
        (status = 400, description = "Malformed body or invalid fields", body = ErrorResponse),
        (status = 500, description = "Broker failure, timeout or missing configuration", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, form))]
pub async fn finalize_resident(
    State(state): State<Arc<AppState>>,
    ValidatedJson(form): ValidatedJson<ResidentRegisterForm>,
) -> Result<impl IntoResponse, HttpAppError> {
    let resident_name = form.resident_name.clone();
    let broker_response = state
        .registrations
        .finalize(&RegistrationForm::Resident(form))
        .await?;

    Ok(ApiResponse::ok(
        "Resident registration finalized successfully",
        ResidentFinalizeResponse {
            resident_name,
            broker_response,
        },
    ))
}

/// Validate a company form and allocate its employer ID
#[utoipa::path(
    post,
    path = "/registers/company",
    tag = "registers",
    request_body = CompanyRegisterForm,
    responses(
        (status = 200, description = "Employer ID allocated", body = ApiResponse<CompanyRegisterResponse>),
        (status = 400, description = "Malformed body or invalid fields", body = ErrorResponse),
        (status = 500, description = "Broker failure or unexpected reply", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, form))]
pub async fn register_company(
    State(state): State<Arc<AppState>>,
    ValidatedJson(form): ValidatedJson<CompanyRegisterForm>,
) -> Result<impl IntoResponse, HttpAppError> {
    let (register_id, employer_id) = state.registrations.initiate_company(form).await?;

    Ok(ApiResponse::ok(
        "Company registration initiated successfully",
        CompanyRegisterResponse {
            register_id,
            employer_id,
        },
    ))
}

/// Submit a company registration to the backend
#[utoipa::path(
    post,
    path = "/registers/company/finalize",
    tag = "registers",
    request_body = CompanyRegisterForm,
    responses(
        (status = 200, description = "Registration dispatched", body = ApiResponse<CompanyFinalizeResponse>),
        (status = 400, description = "Malformed body or invalid fields", body = ErrorResponse),
        (status = 500, description = "Broker failure, timeout or missing configuration", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, form))]
pub async fn finalize_company(
    State(state): State<Arc<AppState>>,
    ValidatedJson(form): ValidatedJson<CompanyRegisterForm>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = form.company_registration_number.clone();
    let broker_response = state
        .registrations
        .finalize(&RegistrationForm::Company(form))
        .await?;

    Ok(ApiResponse::ok(
        "Company registration finalized successfully",
        CompanyFinalizeResponse {
            id,
            broker_response,
        },
    ))
}
