//! CAPTCHA verification against a Turnstile-compatible `siteverify` endpoint.
//!
//! Successful verifications are remembered for [`CAPTCHA_TTL`] so a client can exchange
//! the same widget response more than once without another provider round trip. Entries
//! carry their own expiry: reads ignore stale entries and a periodic sweep drops them.

use anyhow::Context;
use dashmap::DashMap;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// Lifetime of a cached successful verification
pub const CAPTCHA_TTL: Duration = Duration::from_secs(15 * 60);

const VERIFY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    #[serde(default)]
    challenge_ts: Option<String>,
    #[serde(default)]
    hostname: Option<String>,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

#[derive(Clone)]
pub struct CaptchaVerifier {
    http_client: reqwest::Client,
    secret: Option<String>,
    verify_url: String,
    verified: Arc<DashMap<String, Instant>>,
}

impl CaptchaVerifier {
    /// `secret` of `None` makes every verification fail without a network call.
    pub fn new(secret: Option<String>, verify_url: impl Into<String>) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(VERIFY_TIMEOUT)
            .build()
            .context("Failed to create HTTP client for CAPTCHA verification")?;

        Ok(Self {
            http_client,
            secret: secret.filter(|s| !s.is_empty()),
            verify_url: verify_url.into(),
            verified: Arc::new(DashMap::new()),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    pub async fn verify(&self, raw_token: &str, client_ip: Option<&str>) -> bool {
        self.verify_at(raw_token, client_ip, Instant::now()).await
    }

    /// Same as [`verify`](Self::verify) with an explicit clock reading.
    #[tracing::instrument(skip(self, raw_token, now), fields(client_ip = client_ip.unwrap_or("unknown")))]
    pub async fn verify_at(&self, raw_token: &str, client_ip: Option<&str>, now: Instant) -> bool {
        let Some(secret) = self.secret.as_deref() else {
            tracing::warn!("TURNSTILE_SECRET_KEY not configured; rejecting CAPTCHA token");
            return false;
        };

        if raw_token.is_empty() {
            return false;
        }

        if self.is_cached(raw_token, now) {
            tracing::debug!("CAPTCHA token already verified");
            return true;
        }

        match self.call_provider(secret, raw_token, client_ip).await {
            Ok(response) if response.success => {
                tracing::debug!(
                    hostname = ?response.hostname,
                    challenge_ts = ?response.challenge_ts,
                    "CAPTCHA verified"
                );
                self.verified
                    .insert(raw_token.to_string(), now + CAPTCHA_TTL);
                true
            }
            Ok(response) => {
                tracing::info!(error_codes = ?response.error_codes, "CAPTCHA token rejected");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, verify_url = %self.verify_url, "CAPTCHA verification request failed");
                false
            }
        }
    }

    fn is_cached(&self, raw_token: &str, now: Instant) -> bool {
        // Copy the expiry out so the shard guard is released before any removal.
        let expiry = self.verified.get(raw_token).map(|entry| *entry.value());
        match expiry {
            Some(expires_at) if now < expires_at => true,
            Some(_) => {
                self.verified
                    .remove_if(raw_token, |_, expires_at| *expires_at <= now);
                false
            }
            None => false,
        }
    }

    async fn call_provider(
        &self,
        secret: &str,
        raw_token: &str,
        client_ip: Option<&str>,
    ) -> Result<SiteVerifyResponse, reqwest::Error> {
        let mut form = vec![("secret", secret), ("response", raw_token)];
        if let Some(ip) = client_ip {
            form.push(("remoteip", ip));
        }

        self.http_client
            .post(&self.verify_url)
            .form(&form)
            .send()
            .await?
            .error_for_status()?
            .json::<SiteVerifyResponse>()
            .await
    }

    /// Drop entries whose lifetime ended at or before `now`. Returns how many were removed.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let before = self.verified.len();
        self.verified.retain(|_, expires_at| *expires_at > now);
        before.saturating_sub(self.verified.len())
    }

    pub fn cached_len(&self) -> usize {
        self.verified.len()
    }

    /// Periodically purge expired entries until the runtime shuts down.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let verifier = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let removed = verifier.purge_expired(Instant::now());
                if removed > 0 {
                    tracing::debug!(removed, remaining = verifier.cached_len(), "Purged expired CAPTCHA entries");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const SUCCESS_BODY: &str = r#"{"success":true,"challenge_ts":"2026-10-19T08:00:00.000Z","hostname":"register.example.com","error-codes":[]}"#;

    fn verifier_for(server: &mockito::ServerGuard) -> CaptchaVerifier {
        CaptchaVerifier::new(
            Some("test-secret".to_string()),
            format!("{}/siteverify", server.url()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_success_is_served_from_cache_within_ttl() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/siteverify")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("secret".into(), "test-secret".into()),
                Matcher::UrlEncoded("response".into(), "widget-token".into()),
                Matcher::UrlEncoded("remoteip".into(), "203.0.113.7".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(SUCCESS_BODY)
            .expect(1)
            .create_async()
            .await;

        let verifier = verifier_for(&server);
        let start = Instant::now();

        assert!(verifier.verify_at("widget-token", Some("203.0.113.7"), start).await);
        assert!(
            verifier
                .verify_at("widget-token", Some("203.0.113.7"), start + Duration::from_secs(14 * 60))
                .await
        );

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_expired_entry_reverifies_with_provider() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/siteverify")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(SUCCESS_BODY)
            .expect(2)
            .create_async()
            .await;

        let verifier = verifier_for(&server);
        let start = Instant::now();

        assert!(verifier.verify_at("widget-token", None, start).await);
        // Expiry instant itself counts as expired.
        assert!(verifier.verify_at("widget-token", None, start + CAPTCHA_TTL).await);

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejection_is_not_cached() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/siteverify")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success":false,"error-codes":["invalid-input-response"]}"#)
            .expect(2)
            .create_async()
            .await;

        let verifier = verifier_for(&server);
        assert!(!verifier.verify("bogus", None).await);
        assert!(!verifier.verify("bogus", None).await);
        assert_eq!(verifier.cached_len(), 0);

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fails_closed_without_network_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/siteverify")
            .with_status(200)
            .with_body(SUCCESS_BODY)
            .expect(0)
            .create_async()
            .await;

        let unconfigured =
            CaptchaVerifier::new(None, format!("{}/siteverify", server.url())).unwrap();
        assert!(!unconfigured.is_configured());
        assert!(!unconfigured.verify("widget-token", None).await);

        let configured = verifier_for(&server);
        assert!(!configured.verify("", None).await);

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_provider_error_status_returns_false() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/siteverify")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let verifier = verifier_for(&server);
        assert!(!verifier.verify("widget-token", None).await);
    }

    #[tokio::test]
    async fn test_undecodable_reply_returns_false() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/siteverify")
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let verifier = verifier_for(&server);
        assert!(!verifier.verify("widget-token", None).await);
    }

    #[tokio::test]
    async fn test_purge_expired_drops_stale_entries() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/siteverify")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(SUCCESS_BODY)
            .create_async()
            .await;

        let verifier = verifier_for(&server);
        let start = Instant::now();
        assert!(verifier.verify_at("first", None, start).await);
        assert!(
            verifier
                .verify_at("second", None, start + Duration::from_secs(10 * 60))
                .await
        );

        assert_eq!(verifier.purge_expired(start + Duration::from_secs(5 * 60)), 0);
        assert_eq!(verifier.purge_expired(start + CAPTCHA_TTL), 1);
        assert_eq!(verifier.cached_len(), 1);
    }
}
