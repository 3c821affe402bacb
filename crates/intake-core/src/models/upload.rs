use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Exchange a CAPTCHA response for an upload token
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadTokenRequest {
    pub turnstile_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadTokenResponse {
    pub upload_token: String,
    /// Seconds until the token expires
    pub expires_in: i64,
}

/// Query for a presigned PUT URL
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase", default)]
#[into_params(parameter_in = Query)]
pub struct PresignedUrlQuery {
    pub register_id: Option<String>,
    /// `plate` or `general`
    pub file_type: Option<String>,
    pub file_name: Option<String>,
    pub employer_id: Option<String>,
    pub plate_number: Option<String>,
    /// Defaults to `application/octet-stream`
    pub content_type: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PresignedUrlResponse {
    pub url: String,
    pub key: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(default)]
#[into_params(parameter_in = Query)]
pub struct DownloadUrlQuery {
    pub key: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadUrlResponse {
    pub download_url: String,
    pub key: String,
}

/// Static capability document for the upload widget
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientUploadConfig {
    pub max_general_files: String,
    pub max_plate_numbers: String,
    pub concurrent_uploads: String,
}

/// Result of a direct multipart upload to local disk
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileUploadResponse {
    pub status: String,
    pub filename: String,
    pub bytes: u64,
    pub saved_path: String,
    pub project_id: String,
}
