//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Anything that converts into
//! [`AppError`] renders through the same envelope as successful responses:
//! `{success: false, message, code, errors?, suggested_action?}`.

use axum::{
    extract::rejection::JsonRejection,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use intake_core::{AppError, ErrorMetadata, LogLevel};
use intake_services::BrokerError;
use intake_storage::StorageError;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,
    pub message: String,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Per-field violations for validation failures, otherwise the underlying error text
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub errors: Option<Value>,
    /// Suggested action for the client (e.g., "Retry after a short delay")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

/// Wrapper type for AppError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for AppError (external type from intake-core)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::from(err))
    }
}

impl From<JsonRejection> for HttpAppError {
    fn from(rejection: JsonRejection) -> Self {
        HttpAppError(AppError::MalformedBody(rejection.body_text()))
    }
}

/// JSON body extractor that reports deserialization failures in the error envelope
/// (400 "Invalid input format") instead of axum's plain-text rejection.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state)
            .await
            .map_err(HttpAppError::from)?;
        Ok(ValidatedJson(inner))
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    let code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type, code, "Request rejected");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type, code, "Request failed");
        }
        LogLevel::Error => {
            tracing::error!(
                error = %error,
                detail = ?error.detail(),
                error_type,
                code,
                recoverable = error.is_recoverable(),
                "Request failed"
            );
        }
    }
}

fn render(app_error: &AppError) -> (StatusCode, ErrorResponse) {
    let status = StatusCode::from_u16(app_error.http_status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    // Field violations describe the client's own input and are always returned.
    let errors = match app_error {
        AppError::Validation(violations) => serde_json::to_value(violations).ok(),
        _ if app_error.is_sensitive() => None,
        _ => app_error.detail().map(Value::String),
    };

    let body = ErrorResponse {
        success: false,
        message: app_error.client_message(),
        code: app_error.error_code().to_string(),
        errors,
        suggested_action: app_error.suggested_action().map(String::from),
    };

    (status, body)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        log_error(&self.0);
        let (status, body) = render(&self.0);
        (status, Json(body)).into_response()
    }
}

pub fn from_storage_error(err: StorageError) -> AppError {
    match err {
        StorageError::InvalidArgument(msg) | StorageError::InvalidKey(msg) => {
            AppError::InvalidInput(msg)
        }
        StorageError::ConfigError(msg) => AppError::Configuration(msg),
        StorageError::BackendError(msg) => AppError::Signing(msg),
        StorageError::UploadFailed(msg) => AppError::Storage(msg),
        StorageError::IoError(err) => AppError::Storage(format!("IO error: {}", err)),
    }
}

pub fn from_broker_error(err: BrokerError) -> AppError {
    match err {
        BrokerError::Timeout { .. } => AppError::BrokerTimeout(err.to_string()),
        BrokerError::Request { .. } | BrokerError::Connect { .. } => {
            AppError::Broker(err.to_string())
        }
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        HttpAppError(from_storage_error(err))
    }
}

impl From<BrokerError> for HttpAppError {
    fn from(err: BrokerError) -> Self {
        HttpAppError(from_broker_error(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_core::FieldViolation;
    use std::time::Duration;

    #[test]
    fn test_from_storage_error_invalid_argument() {
        let HttpAppError(app_err) =
            StorageError::InvalidArgument("Invalid fileType".to_string()).into();
        match app_err {
            AppError::InvalidInput(msg) => assert_eq!(msg, "Invalid fileType"),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_from_storage_error_backend_is_signing() {
        let HttpAppError(app_err) = StorageError::BackendError("denied".to_string()).into();
        assert!(matches!(app_err, AppError::Signing(_)));
        assert_eq!(app_err.client_message(), "Failed to generate signed URL");
    }

    #[test]
    fn test_from_storage_error_upload_failed() {
        let HttpAppError(app_err) = StorageError::UploadFailed("disk full".to_string()).into();
        assert!(matches!(app_err, AppError::Storage(_)));
        assert_eq!(app_err.http_status_code(), 500);
    }

    #[test]
    fn test_from_broker_timeout() {
        let HttpAppError(app_err) = BrokerError::Timeout {
            subject: "register.individual.S1".to_string(),
            timeout: Duration::from_secs(10),
        }
        .into();
        match app_err {
            AppError::BrokerTimeout(msg) => assert!(msg.contains("register.individual.S1")),
            other => panic!("Expected BrokerTimeout, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_errors_rendered_as_list() {
        let error = AppError::Validation(vec![FieldViolation::new("residentName", "Too short")]);
        let (status, body) = render(&error);

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Validation failed");
        assert_eq!(
            json["errors"],
            serde_json::json!([{"field": "residentName", "message": "Too short"}])
        );
    }

    #[test]
    fn test_dependency_detail_rendered_with_generic_message() {
        let cases = [
            (
                AppError::Broker("no responders".to_string()),
                "Failed to send NATS message",
            ),
            (
                AppError::BrokerTimeout("no reply within 10s".to_string()),
                "Registration backend did not respond in time",
            ),
            (
                AppError::Signing("access denied".to_string()),
                "Failed to generate signed URL",
            ),
        ];

        for (error, message) in cases {
            let (status, body) = render(&error);
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body.message, message);
            assert_eq!(body.errors, error.detail().map(Value::String));
            assert!(body.errors.is_some());
            assert_eq!(
                body.suggested_action.as_deref(),
                error.suggested_action()
            );
        }
    }

    #[test]
    fn test_sensitive_detail_never_rendered() {
        let error = AppError::Internal("connection string leaked".to_string());
        let (_, body) = render(&error);
        assert!(body.errors.is_none());
        assert_eq!(body.message, "Internal server error");
    }

    #[test]
    fn test_configuration_error_message_passthrough() {
        let error = AppError::missing_env("SITE_CODE");
        let (status, body) = render(&error);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, "Missing SITE_CODE environment variable");
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("errors").is_none());
    }
}
