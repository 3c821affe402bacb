use crate::traits::{Storage, StorageError, StorageResult, StoredObject};
use crate::StorageBackend;
use async_trait::async_trait;
use http::Method;
use intake_core::ObjectStorageConfig;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Result as ObjectResult;
use std::time::Duration;
use tokio::io::AsyncRead;

/// S3-compatible storage (AWS S3, Aliyun OSS, MinIO) used for presigned URLs
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
    endpoint_url: Option<String>,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// Credentials come from the OSS settings rather than the AWS environment chain so the
    /// same process can talk to a non-AWS provider. Fails with `ConfigError` when the bucket
    /// is unset or the builder rejects the settings.
    pub fn new(config: &ObjectStorageConfig) -> StorageResult<Self> {
        let bucket = config
            .bucket
            .clone()
            .ok_or_else(|| StorageError::ConfigError("OSS_BUCKET_NAME not configured".to_string()))?;

        let mut builder = AmazonS3Builder::new()
            .with_region(config.region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref access_key_id) = config.access_key_id {
            builder = builder.with_access_key_id(access_key_id.clone());
        }
        if let Some(ref secret) = config.access_key_secret {
            builder = builder.with_secret_access_key(secret.clone());
        }

        if let Some(ref endpoint) = config.endpoint {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http)
                .with_virtual_hosted_style_request(config.virtual_hosted_style);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            store,
            bucket,
            endpoint_url: config.endpoint.clone(),
        })
    }

    async fn sign(&self, method: Method, storage_key: &str, expires_in: Duration) -> StorageResult<String> {
        let location = Path::from(storage_key);
        let url_result: ObjectResult<_> = self
            .store
            .signed_url(method.clone(), &location, expires_in)
            .await;

        let url = url_result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                endpoint = ?self.endpoint_url,
                key = %storage_key,
                method = %method,
                "Presigning failed"
            );
            StorageError::BackendError(e.to_string())
        })?;

        Ok(url.to_string())
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn get_presigned_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.sign(Method::GET, storage_key, expires_in).await
    }

    /// Only `host` is signed. `content_type` is logged for tracing but a PUT with a
    /// different `Content-Type` is still accepted by the store.
    async fn presigned_put_url(
        &self,
        storage_key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        tracing::debug!(
            bucket = %self.bucket,
            key = %storage_key,
            content_type = %content_type,
            expires_in_secs = expires_in.as_secs(),
            "Signing PUT URL"
        );
        self.sign(Method::PUT, storage_key, expires_in).await
    }

    async fn upload_stream(
        &self,
        _storage_key: &str,
        _reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StorageResult<StoredObject> {
        Err(StorageError::ConfigError(
            "Direct uploads to object storage go through presigned URLs".to_string(),
        ))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ObjectStorageConfig {
        ObjectStorageConfig {
            endpoint: Some("http://127.0.0.1:9000".to_string()),
            region: "us-east-1".to_string(),
            access_key_id: Some("test-access-key".to_string()),
            access_key_secret: Some("test-secret-key".to_string()),
            bucket: Some("registrations".to_string()),
            virtual_hosted_style: false,
        }
    }

    fn without_query(url: &str) -> &str {
        url.split('?').next().unwrap()
    }

    #[tokio::test]
    async fn test_put_and_get_urls_address_same_object() {
        let storage = S3Storage::new(&test_config()).unwrap();
        let key = "uploads/r1/plates/ABC123_front.jpg";
        let expires_in = Duration::from_secs(900);

        let put_url = storage
            .presigned_put_url(key, "image/png", expires_in)
            .await
            .unwrap();
        let get_url = storage.get_presigned_url(key, expires_in).await.unwrap();

        assert_eq!(without_query(&put_url), without_query(&get_url));
        assert!(without_query(&put_url).ends_with("/registrations/uploads/r1/plates/ABC123_front.jpg"));
        assert!(put_url.contains("X-Amz-Expires=900"));
        assert!(get_url.contains("X-Amz-Signature="));
        assert_ne!(put_url, get_url);
    }

    #[tokio::test]
    async fn test_put_url_does_not_bind_content_type() {
        let storage = S3Storage::new(&test_config()).unwrap();
        let put_url = storage
            .presigned_put_url("uploads/r1/general/doc.pdf", "application/pdf", Duration::from_secs(900))
            .await
            .unwrap();

        assert!(put_url.contains("X-Amz-SignedHeaders=host"));
        assert!(!put_url.to_ascii_lowercase().contains("content-type"));
    }

    #[test]
    fn test_missing_bucket_is_config_error() {
        let mut config = test_config();
        config.bucket = None;
        assert!(matches!(
            S3Storage::new(&config),
            Err(StorageError::ConfigError(_))
        ));
    }

    #[test]
    fn test_backend_type() {
        let storage = S3Storage::new(&test_config()).unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::S3);
    }
}
