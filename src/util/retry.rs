//! Retry with exponential backoff and jitter.
//!
//! The client never retries on its own beyond the single post-refresh
//! retry; wrap calls in a [`RetryPolicy`] to opt in.

use std::future::Future;
use std::time::Duration;

use crate::error::PlintoError;

/// Retry policy configuration.
///
/// # Example
/// ```no_run
/// use plinto::util::retry::RetryPolicy;
/// use plinto::PlintoClient;
///
/// # async fn example(client: PlintoClient) -> plinto::error::Result<()> {
/// let sessions = RetryPolicy::default()
///     .execute(|| async { client.sessions().list().await })
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Execute an async operation, retrying errors that
    /// [`PlintoError::is_retryable`] accepts.
    ///
    /// A server-provided `Retry-After` replaces the computed backoff, capped
    /// at `max_backoff`.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, PlintoError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, PlintoError>>,
    {
        let mut backoff = self.initial_backoff;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            if !err.is_retryable() || attempt >= self.max_attempts {
                return Err(err);
            }

            let delay = match &err {
                PlintoError::RateLimited {
                    retry_after_secs: Some(secs),
                    ..
                } => Duration::from_secs(*secs).min(self.max_backoff),
                _ => jittered(backoff),
            };
            tracing::warn!(
                attempt,
                max_attempts = self.max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Retrying after error"
            );
            tokio::time::sleep(delay).await;

            backoff = Duration::from_secs_f64(
                (backoff.as_secs_f64() * self.multiplier).min(self.max_backoff.as_secs_f64()),
            );
        }
    }
}

/// 75%-125% of `backoff`.
fn jittered(backoff: Duration) -> Duration {
    backoff.mul_f64(0.75 + rand_factor() * 0.5)
}

/// Pseudo-random factor in [0, 1) from a v4 UUID.
fn rand_factor() -> f64 {
    let bytes = uuid::Uuid::new_v4().into_bytes();
    let sample = u16::from_le_bytes([bytes[0], bytes[1]]);
    f64::from(sample % 10_000) / 10_000.0
}
