//! Request/reply messaging with the registration backend.
//!
//! The HTTP layer only sees [`MessageBroker`]; production wires in [`NatsBroker`].
//! Every call made on behalf of a client goes through [`request_with_timeout`] so a
//! silent backend turns into an error instead of a hung request.

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("Failed to connect to message broker at {url}: {message}")]
    Connect { url: String, message: String },

    #[error("Request on {subject} failed: {message}")]
    Request { subject: String, message: String },

    #[error("No reply on {subject} within {}s", .timeout.as_secs())]
    Timeout { subject: String, timeout: Duration },
}

#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Publish `payload` on `subject` and wait for the first reply.
    async fn request(&self, subject: &str, payload: Bytes) -> Result<Bytes, BrokerError>;
}

/// Issue a request and give up after `timeout`.
pub async fn request_with_timeout(
    broker: &dyn MessageBroker,
    subject: &str,
    payload: Bytes,
    timeout: Duration,
) -> Result<Bytes, BrokerError> {
    let started = std::time::Instant::now();

    let result = match tokio::time::timeout(timeout, broker.request(subject, payload)).await {
        Ok(result) => result,
        Err(_) => Err(BrokerError::Timeout {
            subject: subject.to_string(),
            timeout,
        }),
    };

    match &result {
        Ok(reply) => tracing::debug!(
            subject = %subject,
            reply_bytes = reply.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Broker reply received"
        ),
        Err(e) => tracing::warn!(subject = %subject, error = %e, "Broker request failed"),
    }

    result
}

/// Reply bodies are JSON when they parse as JSON and a plain string otherwise.
pub fn decode_reply(reply: &[u8]) -> Value {
    serde_json::from_slice(reply)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(reply).into_owned()))
}

#[cfg(feature = "nats")]
pub use nats::NatsBroker;

#[cfg(feature = "nats")]
mod nats {
    use super::{BrokerError, MessageBroker};
    use async_nats::RequestErrorKind;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::time::Duration;

    #[derive(Clone)]
    pub struct NatsBroker {
        client: async_nats::Client,
        request_timeout: Duration,
    }

    impl NatsBroker {
        pub async fn connect(url: &str, request_timeout: Duration) -> Result<Self, BrokerError> {
            let client = async_nats::ConnectOptions::new()
                .name("intake-api")
                .request_timeout(Some(request_timeout))
                .connect(url)
                .await
                .map_err(|e| BrokerError::Connect {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;

            tracing::info!(url = %url, "Connected to NATS");

            Ok(Self {
                client,
                request_timeout,
            })
        }
    }

    #[async_trait]
    impl MessageBroker for NatsBroker {
        async fn request(&self, subject: &str, payload: Bytes) -> Result<Bytes, BrokerError> {
            let message = self
                .client
                .request(subject.to_string(), payload)
                .await
                .map_err(|e| match e.kind() {
                    RequestErrorKind::TimedOut => BrokerError::Timeout {
                        subject: subject.to_string(),
                        timeout: self.request_timeout,
                    },
                    _ => BrokerError::Request {
                        subject: subject.to_string(),
                        message: e.to_string(),
                    },
                })?;

            Ok(message.payload)
        }
    }
}
