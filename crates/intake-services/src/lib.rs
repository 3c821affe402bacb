//! Intake Services Layer
//!
//! Outbound integrations the HTTP layer orchestrates: CAPTCHA verification
//! against the Turnstile provider and request/reply messaging with the
//! registration backend.

pub mod broker;
pub mod captcha;

pub use broker::{decode_reply, request_with_timeout, BrokerError, MessageBroker};
#[cfg(feature = "nats")]
pub use broker::NatsBroker;
pub use captcha::{CaptchaVerifier, CAPTCHA_TTL};
