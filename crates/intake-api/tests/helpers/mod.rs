//! Test helpers: build AppState and router for integration tests.
//!
//! The broker is an in-memory fake, the CAPTCHA provider a mockito server and direct
//! uploads land in a temporary directory.

#![allow(dead_code)]

pub mod broker;
pub mod fixtures;

use axum_test::TestServer;
use intake_api::setup::{build_state, routes::setup_routes};
use intake_api::state::AppState;
use intake_core::{Config, IntakeConfig};
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

pub use broker::FakeBroker;

pub const TEST_JWT_SECRET: &str = "integration-test-upload-secret";
pub const GOOD_CAPTCHA: &str = "good-captcha-token";

/// Test application: server, fakes and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub broker: Arc<FakeBroker>,
    pub captcha: mockito::ServerGuard,
    pub state: Arc<AppState>,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn upload_root(&self) -> &std::path::Path {
        self._temp_dir.path()
    }

    /// A valid upload token minted directly, bypassing the CAPTCHA exchange.
    pub fn upload_token(&self) -> String {
        self.state
            .upload_tokens
            .issue(GOOD_CAPTCHA)
            .expect("issue upload token")
            .token
    }
}

fn base_vars(captcha_url: &str, upload_root: &str) -> HashMap<String, String> {
    [
        ("ENVIRONMENT", "test"),
        ("TURNSTILE_SECRET_KEY", "turnstile-test-secret"),
        ("JWT_SECRET", TEST_JWT_SECRET),
        ("OSS_ENDPOINT", "http://127.0.0.1:9000"),
        ("OSS_REGION", "us-east-1"),
        ("OSS_ACCESS_KEY_ID", "test-access-key"),
        ("OSS_ACCESS_KEY_SECRET", "test-secret-key"),
        ("OSS_BUCKET_NAME", "registrations"),
        ("REGISTER_INDIVIDUAL_SUBJECT", "register.individual"),
        ("REGISTER_EMPLOYER_SUBJECT", "register.employer"),
        ("REGISTER_EMPLOYER_ID_SUBJECT", "register.employer.id"),
        ("SITE_CODE", "SITE1"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .chain([
        (
            "TURNSTILE_VERIFY_URL".to_string(),
            format!("{}/siteverify", captcha_url),
        ),
        ("LOCAL_UPLOAD_ROOT".to_string(), upload_root.to_string()),
    ])
    .collect()
}

/// Setup test app with every dependency configured.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(&[], &[]).await
}

/// Setup test app, overriding (`Some`) or removing (`None`) settings.
pub async fn setup_test_app_with(
    overrides: &[(&str, Option<&str>)],
    broker_replies: &[(&str, &[u8])],
) -> TestApp {
    let captcha = mockito::Server::new_async().await;
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

    let mut vars = base_vars(
        &captcha.url(),
        temp_dir.path().to_str().expect("utf-8 temp path"),
    );
    for (key, value) in overrides {
        match value {
            Some(value) => vars.insert(key.to_string(), value.to_string()),
            None => vars.remove(*key),
        };
    }

    let config = Config(Box::new(
        IntakeConfig::from_lookup(|key| vars.get(key).cloned()).expect("test config"),
    ));

    let broker = Arc::new(FakeBroker::new());
    for (subject, reply) in broker_replies {
        broker.reply_to(subject, reply);
    }

    let state = build_state(config, broker.clone())
        .await
        .expect("Failed to build state");
    let router = setup_routes(state.clone()).expect("Failed to set up routes");
    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp {
        server,
        broker,
        captcha,
        state,
        _temp_dir: temp_dir,
    }
}
