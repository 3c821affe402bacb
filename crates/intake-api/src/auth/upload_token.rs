//! Upload-authorization tokens.
//!
//! A token is an HS256 JWT minted after a successful CAPTCHA exchange. It is
//! self-contained: nothing is stored server-side, so a token cannot be revoked and
//! stays reusable until `exp`.

use chrono::{DateTime, Duration, Utc};
use intake_core::AppError;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

pub const UPLOAD_TOKEN_TYPE: &str = "upload_token";
pub const UPLOAD_TOKEN_TTL_SECS: i64 = 15 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadTokenClaims {
    pub turnstile_token: String,
    #[serde(rename = "type")]
    pub token_type: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UploadTokenError {
    #[error("upload token is empty")]
    Empty,
    #[error("upload token is malformed: {0}")]
    Malformed(String),
    #[error("unexpected token type {0:?}")]
    WrongType(String),
    #[error("upload token expired")]
    Expired,
}

#[derive(Debug, Clone)]
pub struct IssuedUploadToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct UploadTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl UploadTokenService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Accept the whole HMAC family; anything else fails signature checks.
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        // Expiry is compared explicitly so `now == exp` counts as expired with no leeway.
        validation.validate_exp = false;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: Duration::seconds(UPLOAD_TOKEN_TTL_SECS),
        }
    }

    pub fn issue(&self, turnstile_token: &str) -> Result<IssuedUploadToken, AppError> {
        self.issue_at(turnstile_token, Utc::now())
    }

    /// Mint a token as of `now`. The CAPTCHA must already have been verified.
    pub fn issue_at(
        &self,
        turnstile_token: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedUploadToken, AppError> {
        let expires_at = now + self.ttl;
        let claims = UploadTokenClaims {
            turnstile_token: turnstile_token.to_string(),
            token_type: UPLOAD_TOKEN_TYPE.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: format!("upload_{}", now.timestamp_nanos_opt().unwrap_or_default()),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to generate upload token: {}", e)))?;

        Ok(IssuedUploadToken { token, expires_at })
    }

    /// Returns the CAPTCHA token the upload token was minted for.
    pub fn validate(&self, token: &str) -> Result<String, UploadTokenError> {
        self.validate_at(token, Utc::now())
    }

    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<String, UploadTokenError> {
        if token.is_empty() {
            return Err(UploadTokenError::Empty);
        }

        let claims = decode::<UploadTokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| UploadTokenError::Malformed(e.to_string()))?
            .claims;

        if claims.token_type != UPLOAD_TOKEN_TYPE {
            return Err(UploadTokenError::WrongType(claims.token_type));
        }

        if now.timestamp() >= claims.exp {
            return Err(UploadTokenError::Expired);
        }

        Ok(claims.turnstile_token)
    }
}
