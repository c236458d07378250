//! Opt-in retry decorator for gateways.

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use std::sync::Arc;
use std::time::Duration;

use super::{CompletionGateway, CompletionRequest};
use crate::error::CompletionError;

/// Exponential backoff settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: usize,
    /// Delay before the first retry
    pub min_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries)
            .with_jitter()
    }
}

/// Gateway decorator that retries retryable completion failures.
///
/// Schema mismatches and client errors are returned immediately.
pub struct RetryingGateway {
    inner: Arc<dyn CompletionGateway>,
    policy: RetryPolicy,
}

impl RetryingGateway {
    /// Wraps `inner` with the default policy.
    pub fn new(inner: Arc<dyn CompletionGateway>) -> Self {
        Self::with_policy(inner, RetryPolicy::default())
    }

    /// Wraps `inner` with a custom policy.
    pub fn with_policy(inner: Arc<dyn CompletionGateway>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl CompletionGateway for RetryingGateway {
    async fn complete_value(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<serde_json::Value, CompletionError> {
        let attempt = || {
            let request = request.clone();
            async move { self.inner.complete_value(request).await }
        };

        attempt
            .retry(self.policy.backoff())
            .when(CompletionError::is_retryable)
            .notify(|err: &CompletionError, delay: Duration| {
                tracing::warn!(
                    gateway = self.inner.name(),
                    error = %err,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying completion"
                );
            })
            .await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
