//! Configuration module
//!
//! Settings are read once at startup. Values that only one operation needs (broker
//! subjects, site code, object storage credentials) stay optional here and are checked
//! when that operation runs, so a gap fails the request with a descriptive error instead
//! of preventing the process from starting.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;
use crate::models::{ClientUploadConfig, RegistrationKind};

const SERVER_PORT: u16 = 8081;
const BROKER_TIMEOUT_SECS: u64 = 10;
const HTTP_CONCURRENCY_LIMIT: usize = 10_000;
const MAX_REQUEST_BODY_MB: usize = 50;
const CAPTCHA_SWEEP_INTERVAL_SECS: u64 = 60;
const DEFAULT_NATS_URL: &str = "nats://127.0.0.1:4222";
const DEFAULT_OSS_REGION: &str = "us-east-1";

/// Cloudflare Turnstile verification endpoint
pub const TURNSTILE_VERIFY_URL: &str =
    "https://challenges.cloudflare.com/turnstile/v0/siteverify";

/// Fallback upload-token signing secret. Only suitable for local development.
pub const DEV_UPLOAD_TOKEN_SECRET: &str = "your-default-jwt-secret-change-in-production";

/// HTTP server settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub http_concurrency_limit: usize,
    pub max_request_body_bytes: usize,
    pub trusted_proxy_count: usize,
}

/// S3-compatible object storage (OSS) used for presigned URLs
#[derive(Clone, Debug)]
pub struct ObjectStorageConfig {
    pub endpoint: Option<String>,
    pub region: String,
    pub access_key_id: Option<String>,
    pub access_key_secret: Option<String>,
    pub bucket: Option<String>,
    /// When true the endpoint must already contain the bucket host
    pub virtual_hosted_style: bool,
}

impl ObjectStorageConfig {
    /// Name of the first required setting that is unset, if any.
    pub fn missing_setting(&self) -> Option<&'static str> {
        if self.bucket.is_none() {
            Some("OSS_BUCKET_NAME")
        } else if self.access_key_id.is_none() {
            Some("OSS_ACCESS_KEY_ID")
        } else if self.access_key_secret.is_none() {
            Some("OSS_ACCESS_KEY_SECRET")
        } else {
            None
        }
    }
}

/// Message broker settings
#[derive(Clone, Debug)]
pub struct BrokerConfig {
    pub url: String,
    pub request_timeout: Duration,
    pub individual_subject: Option<String>,
    pub employer_subject: Option<String>,
    pub employer_id_subject: Option<String>,
    pub site_code: Option<String>,
}

impl BrokerConfig {
    /// Subject a finalized registration of `kind` is sent on: `{prefix}.{siteCode}`.
    pub fn finalize_subject(&self, kind: RegistrationKind) -> Result<String, AppError> {
        let prefix = match kind {
            RegistrationKind::Resident => self.individual_subject.as_deref(),
            RegistrationKind::Company => self.employer_subject.as_deref(),
        };
        self.compose(kind.subject_env(), prefix)
    }

    /// Subject used to allocate a new employer identifier.
    pub fn employer_id_subject(&self) -> Result<String, AppError> {
        self.compose(
            "REGISTER_EMPLOYER_ID_SUBJECT",
            self.employer_id_subject.as_deref(),
        )
    }

    fn compose(&self, prefix_env: &str, prefix: Option<&str>) -> Result<String, AppError> {
        let prefix = prefix.ok_or_else(|| AppError::missing_env(prefix_env))?;
        let site_code = self
            .site_code
            .as_deref()
            .ok_or_else(|| AppError::missing_env("SITE_CODE"))?;
        Ok(format!("{}.{}", prefix, site_code))
    }
}

/// Full service configuration
#[derive(Clone, Debug)]
pub struct IntakeConfig {
    pub base: BaseConfig,
    pub storage: ObjectStorageConfig,
    pub broker: BrokerConfig,
    pub turnstile_secret_key: Option<String>,
    pub turnstile_verify_url: String,
    pub captcha_sweep_interval_secs: u64,
    pub upload_token_secret: Option<String>,
    pub local_upload_root: String,
    pub client_upload: ClientUploadConfig,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<IntakeConfig>);

impl Config {
    fn as_intake(&self) -> &IntakeConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = IntakeConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_name(&self.as_intake().base.environment)
    }

    pub fn server_port(&self) -> u16 {
        self.as_intake().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_intake().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.as_intake().base.environment
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.as_intake().base.http_concurrency_limit
    }

    pub fn max_request_body_bytes(&self) -> usize {
        self.as_intake().base.max_request_body_bytes
    }

    pub fn trusted_proxy_count(&self) -> usize {
        self.as_intake().base.trusted_proxy_count
    }

    pub fn object_storage(&self) -> &ObjectStorageConfig {
        &self.as_intake().storage
    }

    pub fn broker(&self) -> &BrokerConfig {
        &self.as_intake().broker
    }

    pub fn turnstile_secret_key(&self) -> Option<&str> {
        self.as_intake().turnstile_secret_key.as_deref()
    }

    pub fn turnstile_verify_url(&self) -> &str {
        &self.as_intake().turnstile_verify_url
    }

    pub fn captcha_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.as_intake().captcha_sweep_interval_secs)
    }

    pub fn upload_token_secret(&self) -> Option<&str> {
        self.as_intake().upload_token_secret.as_deref()
    }

    pub fn local_upload_root(&self) -> &str {
        &self.as_intake().local_upload_root
    }

    pub fn client_upload(&self) -> &ClientUploadConfig {
        &self.as_intake().client_upload
    }
}

fn is_production_name(environment: &str) -> bool {
    let environment = environment.to_lowercase();
    environment == "production" || environment == "prod"
}

fn parsed_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

impl IntakeConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = get("ENVIRONMENT")
            .or_else(|| get("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins_str = get("CORS_ORIGINS").unwrap_or_else(|| "*".to_string());
        if is_production_name(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        let cors_origins = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let base = BaseConfig {
            server_port: match get("PORT") {
                Some(port) => port
                    .trim()
                    .parse()
                    .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
                None => SERVER_PORT,
            },
            cors_origins,
            environment,
            http_concurrency_limit: parsed_or(get("HTTP_CONCURRENCY_LIMIT"), HTTP_CONCURRENCY_LIMIT)
                .max(1),
            max_request_body_bytes: parsed_or(get("MAX_REQUEST_BODY_MB"), MAX_REQUEST_BODY_MB)
                .max(1)
                * 1024
                * 1024,
            trusted_proxy_count: parsed_or(get("TRUSTED_PROXY_COUNT"), 0),
        };

        let storage = ObjectStorageConfig {
            endpoint: get("OSS_ENDPOINT"),
            region: get("OSS_REGION").unwrap_or_else(|| DEFAULT_OSS_REGION.to_string()),
            access_key_id: get("OSS_ACCESS_KEY_ID"),
            access_key_secret: get("OSS_ACCESS_KEY_SECRET"),
            bucket: get("OSS_BUCKET_NAME"),
            virtual_hosted_style: parsed_or(get("OSS_VIRTUAL_HOSTED_STYLE"), false),
        };

        let broker = BrokerConfig {
            url: get("NATS_URL").unwrap_or_else(|| DEFAULT_NATS_URL.to_string()),
            request_timeout: Duration::from_secs(
                parsed_or(get("BROKER_TIMEOUT_SECS"), BROKER_TIMEOUT_SECS).max(1),
            ),
            individual_subject: get("REGISTER_INDIVIDUAL_SUBJECT"),
            employer_subject: get("REGISTER_EMPLOYER_SUBJECT"),
            employer_id_subject: get("REGISTER_EMPLOYER_ID_SUBJECT"),
            site_code: get("SITE_CODE"),
        };

        let client_upload = ClientUploadConfig {
            max_general_files: parsed_or::<u32>(get("MAX_GENERAL_FILES"), 2).to_string(),
            max_plate_numbers: parsed_or::<u32>(get("MAX_PLATE_NUMBERS"), 5).to_string(),
            concurrent_uploads: parsed_or::<u32>(get("CONCURRENT_UPLOADS"), 2).to_string(),
        };

        Ok(IntakeConfig {
            base,
            storage,
            broker,
            turnstile_secret_key: get("TURNSTILE_SECRET_KEY"),
            turnstile_verify_url: get("TURNSTILE_VERIFY_URL")
                .unwrap_or_else(|| TURNSTILE_VERIFY_URL.to_string()),
            captcha_sweep_interval_secs: parsed_or(
                get("CAPTCHA_SWEEP_INTERVAL_SECS"),
                CAPTCHA_SWEEP_INTERVAL_SECS,
            )
            .max(1),
            upload_token_secret: get("JWT_SECRET").or_else(|| get("JWT_SECRET_KEY")),
            local_upload_root: get("LOCAL_UPLOAD_ROOT").unwrap_or_else(|| ".".to_string()),
            client_upload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<IntakeConfig, anyhow::Error> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        IntakeConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.base.server_port, 8081);
        assert_eq!(config.base.cors_origins, vec!["*".to_string()]);
        assert_eq!(config.broker.request_timeout, Duration::from_secs(10));
        assert_eq!(config.broker.url, "nats://127.0.0.1:4222");
        assert_eq!(config.turnstile_verify_url, TURNSTILE_VERIFY_URL);
        assert!(config.turnstile_secret_key.is_none());
        assert!(config.upload_token_secret.is_none());
        assert_eq!(config.client_upload.max_general_files, "2");
        assert_eq!(config.client_upload.max_plate_numbers, "5");
        assert_eq!(config.client_upload.concurrent_uploads, "2");
        assert_eq!(config.storage.missing_setting(), Some("OSS_BUCKET_NAME"));
    }

    #[test]
    fn test_finalize_subject_composes_prefix_and_site() {
        let config = config_from(&[
            ("REGISTER_INDIVIDUAL_SUBJECT", "register.individual"),
            ("REGISTER_EMPLOYER_SUBJECT", "register.employer"),
            ("SITE_CODE", "KLCC01"),
        ])
        .unwrap();
        assert_eq!(
            config
                .broker
                .finalize_subject(RegistrationKind::Resident)
                .unwrap(),
            "register.individual.KLCC01"
        );
        assert_eq!(
            config
                .broker
                .finalize_subject(RegistrationKind::Company)
                .unwrap(),
            "register.employer.KLCC01"
        );
    }

    #[test]
    fn test_missing_subject_parts_are_configuration_errors() {
        let config = config_from(&[("REGISTER_INDIVIDUAL_SUBJECT", "register.individual")]).unwrap();
        match config.broker.finalize_subject(RegistrationKind::Resident) {
            Err(AppError::Configuration(msg)) => {
                assert_eq!(msg, "Missing SITE_CODE environment variable")
            }
            other => panic!("Expected Configuration error, got {:?}", other),
        }

        let config = config_from(&[("SITE_CODE", "KLCC01"), ("REGISTER_EMPLOYER_SUBJECT", " ")])
            .unwrap();
        match config.broker.finalize_subject(RegistrationKind::Company) {
            Err(AppError::Configuration(msg)) => {
                assert_eq!(msg, "Missing REGISTER_EMPLOYER_SUBJECT environment variable")
            }
            other => panic!("Expected Configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_jwt_secret_alias() {
        let config = config_from(&[("JWT_SECRET_KEY", "alias-secret")]).unwrap();
        assert_eq!(config.upload_token_secret.as_deref(), Some("alias-secret"));

        let config =
            config_from(&[("JWT_SECRET", "primary"), ("JWT_SECRET_KEY", "alias")]).unwrap();
        assert_eq!(config.upload_token_secret.as_deref(), Some("primary"));
    }

    #[test]
    fn test_production_rejects_wildcard_cors() {
        assert!(config_from(&[("ENVIRONMENT", "production")]).is_err());
        assert!(config_from(&[
            ("ENVIRONMENT", "production"),
            ("CORS_ORIGINS", "https://register.example.com")
        ])
        .is_ok());
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        assert!(config_from(&[("PORT", "eighty")]).is_err());
    }
}
