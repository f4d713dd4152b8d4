use std::future::Future;
use std::time::Duration;

use super::error::{CmsError, ErrorKind};

/// When and how long to wait between Content API attempts.
///
/// Only rate limiting is retried: other failures either will not change on
/// a second try (404, bad body) or are better served from the long-term
/// cache right away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Wait after the first failed attempt.
    pub base_delay: Duration,
    /// Growth factor applied per further attempt. Values below 2 are
    /// treated as 2 so every wait is longer than the one before.
    pub multiplier: u32,
    /// Upper bound for any single wait.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(30),
            multiplier: 2,
            max_delay: Duration::from_secs(300),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(self, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..self
        }
    }

    /// Wait before retrying after failed attempt number `attempt` (0-based).
    ///
    /// `base_delay * multiplier^attempt`, capped at `max_delay`.
    ///
    /// Waits strictly grow until they reach the cap. The default policy
    /// gives up after two waits (30 s, 60 s), well below it.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(2).saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    pub fn is_retryable(&self, kind: ErrorKind) -> bool {
        kind == ErrorKind::RateLimited
    }
}

/// Run `call` under `policy`, sleeping between retryable failures.
///
/// Returns the first success, or the last error once the policy gives up.
pub async fn execute<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut call: F,
) -> Result<T, CmsError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CmsError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        let error = match call().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };
        attempt += 1;
        let kind = error.kind();

        if !policy.is_retryable(kind) {
            tracing::debug!(operation = %operation, kind = ?kind, "Not retrying CMS error");
            return Err(error);
        }
        if attempt >= max_attempts {
            tracing::warn!(
                operation = %operation,
                attempts = attempt,
                "Rate limited, retries exhausted"
            );
            return Err(error);
        }

        let delay = policy.backoff(attempt - 1);
        tracing::warn!(
            operation = %operation,
            attempt = attempt,
            max_attempts = max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Rate limited, backing off"
        );
        tokio::time::sleep(delay).await;
    }
}
