//! In-memory request/reply broker.

use async_trait::async_trait;
use bytes::Bytes;
use intake_services::{BrokerError, MessageBroker};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Replies with a canned payload per subject and records every request.
/// Subjects without a reply fail the way a broker without responders does; silent
/// subjects accept the request and never answer.
#[derive(Default)]
pub struct FakeBroker {
    replies: Mutex<HashMap<String, Bytes>>,
    silent: Mutex<HashSet<String>>,
    requests: Mutex<Vec<(String, Bytes)>>,
}

impl FakeBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply_to(&self, subject: &str, reply: &[u8]) {
        self.replies
            .lock()
            .unwrap()
            .insert(subject.to_string(), Bytes::copy_from_slice(reply));
    }

    pub fn never_reply(&self, subject: &str) {
        self.silent.lock().unwrap().insert(subject.to_string());
    }

    pub fn requests(&self) -> Vec<(String, Bytes)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_on(&self, subject: &str) -> Vec<serde_json::Value> {
        self.requests()
            .into_iter()
            .filter(|(s, _)| s == subject)
            .map(|(_, payload)| serde_json::from_slice(&payload).unwrap_or_default())
            .collect()
    }
}

#[async_trait]
impl MessageBroker for FakeBroker {
    async fn request(&self, subject: &str, payload: Bytes) -> Result<Bytes, BrokerError> {
        self.requests
            .lock()
            .unwrap()
            .push((subject.to_string(), payload));

        let silent = self.silent.lock().unwrap().contains(subject);
        if silent {
            return std::future::pending().await;
        }

        self.replies
            .lock()
            .unwrap()
            .get(subject)
            .cloned()
            .ok_or_else(|| BrokerError::Request {
                subject: subject.to_string(),
                message: "no responders available for request".to_string(),
            })
    }
}
