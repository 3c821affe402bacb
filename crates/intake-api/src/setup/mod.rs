//! Application setup and initialization
//!
//! Startup order: tracing, broker connection, state, background sweep, routes. A broker
//! that cannot be reached is fatal; missing per-operation settings only warn.

pub mod routes;
pub mod server;

use crate::auth::UploadTokenService;
use crate::services::RegistrationService;
use crate::state::AppState;
use anyhow::{Context, Result};
use intake_core::config::DEV_UPLOAD_TOKEN_SECRET;
use intake_core::Config;
use intake_infra::{init_telemetry, LogFormat};
use intake_services::{CaptchaVerifier, MessageBroker, NatsBroker};
use intake_storage::{create_local_storage, create_signer};
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    init_telemetry(config.environment(), LogFormat::from_env())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(environment = %config.environment(), "Configuration loaded");

    let broker_config = config.broker();
    let broker = NatsBroker::connect(&broker_config.url, broker_config.request_timeout)
        .await
        .with_context(|| format!("Failed to connect to NATS at {}", broker_config.url))?;
    tracing::info!(url = %broker_config.url, "Connected to NATS");

    let state = build_state(config, Arc::new(broker)).await?;
    state
        .captcha
        .spawn_sweeper(state.config.captcha_sweep_interval());

    let router = routes::setup_routes(state.clone())?;

    Ok((state, router))
}

/// Assemble shared state around an already connected broker.
pub async fn build_state(config: Config, broker: Arc<dyn MessageBroker>) -> Result<Arc<AppState>> {
    if config.turnstile_secret_key().is_none() {
        tracing::warn!("TURNSTILE_SECRET_KEY not set; every CAPTCHA verification will fail");
    }
    let captcha = CaptchaVerifier::new(
        config.turnstile_secret_key().map(str::to_string),
        config.turnstile_verify_url(),
    )
    .context("Failed to build CAPTCHA client")?;

    let secret = match config.upload_token_secret() {
        Some(secret) => secret,
        None => {
            tracing::warn!("JWT_SECRET not set; signing upload tokens with the development secret");
            DEV_UPLOAD_TOKEN_SECRET
        }
    };
    let upload_tokens = Arc::new(UploadTokenService::new(secret));

    let signer = create_signer(&config).context("Failed to configure object storage")?;
    let local_storage = create_local_storage(&config)
        .await
        .context("Failed to prepare local upload directory")?;
    tracing::info!(
        signer = ?signer.as_ref().map(|s| s.backend_type()),
        uploads = %local_storage.backend_type(),
        upload_root = %config.local_upload_root(),
        "Storage backends ready"
    );

    let registrations = RegistrationService::new(broker, config.broker().clone());

    Ok(Arc::new(AppState {
        config,
        captcha,
        upload_tokens,
        signer,
        local_storage,
        registrations,
    }))
}
