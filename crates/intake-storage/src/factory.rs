use crate::{LocalStorage, S3Storage, Storage, StorageResult};
use intake_core::Config;
use std::sync::Arc;

/// Create the presigning backend, or `None` while object storage is not configured.
///
/// A missing setting is reported again on every presign request, so startup only warns.
pub fn create_signer(config: &Config) -> StorageResult<Option<Arc<dyn Storage>>> {
    let storage_config = config.object_storage();
    if let Some(missing) = storage_config.missing_setting() {
        tracing::warn!(
            missing = missing,
            "Object storage not configured; presigned URL requests will fail"
        );
        return Ok(None);
    }

    let storage = S3Storage::new(storage_config)?;
    tracing::info!(
        bucket = storage_config.bucket.as_deref().unwrap_or_default(),
        endpoint = storage_config.endpoint.as_deref().unwrap_or("aws"),
        "Object storage signer ready"
    );
    Ok(Some(Arc::new(storage)))
}

/// Create the local backend that receives direct multipart uploads.
pub async fn create_local_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    let storage = LocalStorage::new(config.local_upload_root()).await?;
    Ok(Arc::new(storage))
}
