//! Error types module
//!
//! All failures that reach the HTTP boundary are unified under [`AppError`]. Each variant
//! describes itself through [`ErrorMetadata`] so the API layer can render the status code,
//! envelope message and log level without matching on variants again.

use std::io;

use serde::Serialize;
use utoipa::ToSchema;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for misconfiguration that only affects one request
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "BROKER_TIMEOUT")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (the envelope `message` field)
    fn client_message(&self) -> String;

    /// Whether the underlying detail is withheld from responses
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// One failed declarative constraint, reported against the JSON field path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    #[error("Validation failed: {} field(s)", .0.len())]
    Validation(Vec<FieldViolation>),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Broker error: {0}")]
    Broker(String),

    #[error("Broker timeout: {0}")]
    BrokerTimeout(String),

    #[error("Unexpected broker reply: {0}")]
    BrokerReply(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    /// Configuration error for an environment variable that an operation needs but is unset.
    pub fn missing_env(name: &str) -> Self {
        AppError::Configuration(format!("Missing {} environment variable", name))
    }

    /// Short variant name used as a structured log field.
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::MalformedBody(_) => "MalformedBody",
            AppError::Validation(_) => "Validation",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Signing(_) => "Signing",
            AppError::Storage(_) => "Storage",
            AppError::Broker(_) => "Broker",
            AppError::BrokerTimeout(_) => "BrokerTimeout",
            AppError::BrokerReply(_) => "BrokerReply",
            AppError::Configuration(_) => "Configuration",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "InternalWithSource",
        }
    }

    /// Underlying detail for the envelope `errors` field.
    ///
    /// Validation failures are rendered as a list by the API layer, so they return `None` here.
    pub fn detail(&self) -> Option<String> {
        match self {
            AppError::MalformedBody(msg)
            | AppError::Signing(msg)
            | AppError::Storage(msg)
            | AppError::Broker(msg)
            | AppError::BrokerTimeout(msg)
            | AppError::BrokerReply(msg)
            | AppError::Internal(msg) => Some(msg.clone()),
            AppError::InternalWithSource { message, source } => {
                let mut chain = vec![message.clone()];
                chain.extend(source.chain().skip(1).map(|cause| cause.to_string()));
                Some(chain.join(": "))
            }
            AppError::Validation(_)
            | AppError::InvalidInput(_)
            | AppError::Unauthorized(_)
            | AppError::Configuration(_) => None,
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Storage(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON serialization error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(crate::validation::field_violations(&err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::MalformedBody(_) => (
            400,
            "MALFORMED_BODY",
            false,
            Some("Check the request body is valid JSON of the expected shape"),
            false,
            LogLevel::Debug,
        ),
        AppError::Validation(_) => (
            400,
            "VALIDATION_FAILED",
            false,
            Some("Correct the listed fields and resubmit"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::Unauthorized(_) => (
            401,
            "UNAUTHORIZED",
            false,
            Some("Request a new upload token"),
            false,
            LogLevel::Debug,
        ),
        AppError::Signing(_) => (
            500,
            "SIGNING_ERROR",
            true,
            Some("Retry after a short delay"),
            false,
            LogLevel::Error,
        ),
        AppError::Storage(_) => (
            500,
            "STORAGE_ERROR",
            true,
            Some("Retry after a short delay"),
            false,
            LogLevel::Error,
        ),
        AppError::Broker(_) => (
            500,
            "BROKER_ERROR",
            true,
            Some("Retry after a short delay"),
            false,
            LogLevel::Error,
        ),
        AppError::BrokerTimeout(_) => (
            500,
            "BROKER_TIMEOUT",
            true,
            Some("Resubmit the registration"),
            false,
            LogLevel::Error,
        ),
        AppError::BrokerReply(_) => (
            500,
            "BROKER_REPLY_INVALID",
            true,
            Some("Retry after a short delay"),
            false,
            LogLevel::Error,
        ),
        AppError::Configuration(_) => (
            500,
            "CONFIGURATION_ERROR",
            false,
            Some("Contact the service operator"),
            false,
            LogLevel::Warn,
        ),
        AppError::Internal(_) => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::MalformedBody(_) => "Invalid input format".to_string(),
            AppError::Validation(_) => "Validation failed".to_string(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::Unauthorized(ref msg) => msg.clone(),
            AppError::Signing(_) => "Failed to generate signed URL".to_string(),
            AppError::Storage(_) => "Failed to save file on server".to_string(),
            AppError::Broker(_) => "Failed to send NATS message".to_string(),
            AppError::BrokerTimeout(_) => "Registration backend did not respond in time".to_string(),
            AppError::BrokerReply(_) => "Invalid response format".to_string(),
            AppError::Configuration(ref msg) => msg.clone(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}
