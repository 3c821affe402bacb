//! Intake Core Library
//!
//! Domain models, error types, configuration and form validation shared by the
//! intake crates.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::{BaseConfig, BrokerConfig, Config, IntakeConfig, ObjectStorageConfig};
pub use error::{AppError, ErrorMetadata, FieldViolation, LogLevel};
pub use storage_types::StorageBackend;
