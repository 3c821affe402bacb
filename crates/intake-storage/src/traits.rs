//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Where a streamed upload ended up.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub key: String,
    /// Backend-specific location (filesystem path or object URL)
    pub location: String,
    pub size_bytes: u64,
}

/// Storage abstraction trait
///
/// Keys follow the layout documented in [`crate::keys`].
#[async_trait]
pub trait Storage: Send + Sync {
    /// Generate a presigned/temporary URL for direct access (GET)
    async fn get_presigned_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Generate a presigned PUT URL for direct uploads.
    ///
    /// Clients can upload with HTTP PUT to the returned URL. Only supported by S3 backends;
    /// other backends return a `ConfigError`.
    ///
    /// `content_type` is not bound into the signature: the URL accepts a PUT with any
    /// `Content-Type`, so the client is trusted to send the one it asked for.
    async fn presigned_put_url(
        &self,
        storage_key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Copy a reader to `storage_key` until EOF without buffering the whole payload.
    ///
    /// Only supported by the local backend; S3 uploads go through presigned URLs.
    async fn upload_stream(
        &self,
        storage_key: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StorageResult<StoredObject>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
