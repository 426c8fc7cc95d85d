//! Timeout retry.

use crate::error::TransportResult;
use crate::transport::Transport;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// How often a timed-out request is re-sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first. `None` retries until the request
    /// stops timing out.
    pub max_attempts: Option<u32>,
    /// Pause between attempts, in milliseconds.
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Some(3),
            backoff_ms: 500,
        }
    }
}

impl RetryPolicy {
    /// Retries every timeout, without pausing.
    pub fn unbounded() -> Self {
        Self {
            max_attempts: None,
            backoff_ms: 0,
        }
    }

    /// At most `attempts` tries in total.
    pub fn attempts(attempts: u32) -> Self {
        Self {
            max_attempts: Some(attempts),
            ..Self::default()
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff_ms = backoff.as_millis() as u64;
        self
    }

    fn allows_another(&self, attempts_made: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempts_made < max)
    }
}

/// Wraps a transport and re-sends requests that timed out. Every other
/// outcome, success or failure, is returned as is.
#[derive(Debug, Clone)]
pub struct RetryingTransport<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T: Transport> RetryingTransport<T> {
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// The wrapped transport.
    pub fn inner(&self) -> &T {
        &self.inner
    }

    fn with_retry(
        &self,
        url: &str,
        call: impl Fn(&T) -> TransportResult<String>,
    ) -> TransportResult<String> {
        let mut attempts = 1;
        loop {
            match call(&self.inner) {
                Err(e) if e.is_timeout() && self.policy.allows_another(attempts) => {
                    warn!(url, attempt = attempts, "Request timed out, trying again");
                    if self.policy.backoff_ms > 0 {
                        std::thread::sleep(Duration::from_millis(self.policy.backoff_ms));
                    }
                    attempts += 1;
                }
                outcome => return outcome,
            }
        }
    }
}

impl<T: Transport> Transport for RetryingTransport<T> {
    fn get(&self, url: &str) -> TransportResult<String> {
        self.with_retry(url, |t| t.get(url))
    }

    fn post(&self, url: &str, body: &str) -> TransportResult<String> {
        self.with_retry(url, |t| t.post(url, body))
    }

    fn delete(&self, url: &str) -> TransportResult<String> {
        self.with_retry(url, |t| t.delete(url))
    }
}
