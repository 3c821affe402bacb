//! Application state shared by every handler.

use crate::auth::UploadTokenService;
use crate::services::RegistrationService;
use intake_core::{AppError, Config};
use intake_services::CaptchaVerifier;
use intake_storage::Storage;
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub captcha: CaptchaVerifier,
    pub upload_tokens: Arc<UploadTokenService>,
    /// `None` until object storage is fully configured
    pub signer: Option<Arc<dyn Storage>>,
    /// Receives direct multipart uploads
    pub local_storage: Arc<dyn Storage>,
    pub registrations: RegistrationService,
}

impl AppState {
    /// The presigning backend, or the configuration error naming the first missing setting.
    pub fn signer(&self) -> Result<&Arc<dyn Storage>, AppError> {
        self.signer.as_ref().ok_or_else(|| {
            let missing = self
                .config
                .object_storage()
                .missing_setting()
                .unwrap_or("OSS_BUCKET_NAME");
            AppError::missing_env(missing)
        })
    }
}
