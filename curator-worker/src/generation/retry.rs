//! Retry with exponential backoff for transient generation faults

use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

use super::{GenerationBackend, GenerationError, GenerationRequest, GenerationResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (0-based): doubling, capped
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Wraps a backend and retries transient errors according to a [`RetryPolicy`]
pub struct Retrying<B> {
    inner: B,
    policy: RetryPolicy,
}

impl<B> Retrying<B> {
    pub fn new(inner: B, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<B: GenerationBackend> GenerationBackend for Retrying<B> {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, GenerationError> {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let err = match self.inner.generate(request).await {
                Ok(response) => return Ok(response),
                Err(err) => err,
            };

            if !err.is_transient() {
                return Err(err);
            }

            if attempt > self.policy.max_retries {
                if attempt == 1 {
                    return Err(err);
                }
                return Err(GenerationError::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            let delay = self.policy.delay_for(attempt - 1);
            warn!(
                "Generation attempt {}/{} failed: {}. Retrying in {:?}",
                attempt,
                self.policy.max_retries + 1,
                err,
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }
}
