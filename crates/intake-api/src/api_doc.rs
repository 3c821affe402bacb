//! OpenAPI documentation served at `/api/openapi.json` and browsable at `/docs`.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;
use intake_core::models;

/// Registers the upload token as both a bearer token and an `uploadToken` query parameter.
struct UploadTokenSecurity;

impl Modify for UploadTokenSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "upload_token",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
        components.add_security_scheme(
            "upload_token_query",
            SecurityScheme::ApiKey(ApiKey::Query(ApiKeyValue::new("uploadToken"))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Registration Intake API",
        version = "0.1.0",
        description = "Front door for resident and company vehicle registrations: CAPTCHA-gated upload tokens, presigned object storage URLs, form validation and dispatch to the registration backend."
    ),
    paths(
        // Uploads
        handlers::upload_token::issue_upload_token,
        handlers::presigned::presigned_upload_url,
        handlers::presigned::presigned_download_url,
        handlers::uploads::upload_plate_file,
        handlers::uploads::upload_general_file,
        // Registrations
        handlers::registers::register_resident,
        handlers::registers::finalize_resident,
        handlers::registers::register_company,
        handlers::registers::finalize_company,
        // Service
        handlers::config::get_config,
        handlers::health::liveness_check,
    ),
    components(
        schemas(
            models::ResidentRegisterForm,
            models::ResidentPlate,
            models::ResidentSupportingFiles,
            models::CompanyRegisterForm,
            models::CompanyPlate,
            models::CompanySupportingFiles,
            models::RegisterIdResponse,
            models::CompanyRegisterResponse,
            models::ResidentFinalizeResponse,
            models::CompanyFinalizeResponse,
            models::UploadTokenRequest,
            models::UploadTokenResponse,
            models::PresignedUrlResponse,
            models::DownloadUrlResponse,
            models::ClientUploadConfig,
            models::FileUploadResponse,
            intake_core::FieldViolation,
            error::ErrorResponse,
        )
    ),
    modifiers(&UploadTokenSecurity),
    tags(
        (name = "uploads", description = "Upload tokens, presigned URLs and direct multipart uploads"),
        (name = "registers", description = "Resident and company registration forms"),
        (name = "config", description = "Client upload limits"),
        (name = "health", description = "Liveness check")
    )
)]
pub struct ApiDoc;
