//! Bounded fixed-delay retry for request/response fetches.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::ProviderResult;
use crate::provider::{DataProvider, Params};

/// Retry behaviour for data fetches.
///
/// The default is 2 retries (3 attempts) with a constant 1 second delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before each retry.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            delay: Duration::ZERO,
        }
    }

    /// Set the number of retries.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the delay between attempts.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Total attempts including the first.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Whether another attempt is allowed after `attempt` attempts have failed.
    #[must_use]
    pub const fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts()
    }
}

/// Run `op` until it succeeds or the policy is exhausted.
///
/// Returns the last error once every attempt has failed.
pub async fn retry_with_policy<F, Fut, T, E>(policy: &RetryPolicy, mut op: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if !policy.should_retry(attempt) {
                    return Err(e);
                }
                debug!(attempt, error = %e, "attempt failed, retrying");
                sleep(policy.delay).await;
            }
        }
    }
}

/// Fetch `endpoint` through `provider`, retrying per `policy`.
pub async fn fetch_with_retry(
    provider: Arc<dyn DataProvider>,
    endpoint: String,
    params: Option<Params>,
    policy: RetryPolicy,
) -> ProviderResult<Value> {
    let result = retry_with_policy(&policy, |attempt| {
        let provider = Arc::clone(&provider);
        let endpoint = endpoint.clone();
        let params = params.clone();
        async move {
            debug!(endpoint = %endpoint, attempt, "fetching widget data");
            provider.fetch(&endpoint, params.as_ref()).await
        }
    })
    .await;

    if let Err(e) = &result {
        warn!(
            endpoint = %endpoint,
            attempts = policy.max_attempts(),
            error = %e,
            "fetch failed after all retries"
        );
    }

    result
}
