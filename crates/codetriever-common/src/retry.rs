//! Exponential backoff with jitter, shared by any client that talks to a
//! flaky external backend (embedding generation, vector store upserts).
//!
//! Grounded on spec.md §4.3: `base * 2^attempt` plus uniform jitter in
//! `[0, base/2)`, capped at 30s, cancellable at every wait.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;

/// A cancelled retry loop. Propagates unmodified per spec.md §7.
#[derive(Debug, thiserror::Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Backoff schedule for a retryable operation.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Number of retries after the first attempt (so `max_retries + 1` total attempts).
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self { max_retries, base_delay, max_delay: Duration::from_secs(30) }
    }

    /// `base * 2^attempt` plus uniform jitter in `[0, base/2)`, capped at `max_delay`.
    fn backoff(&self, attempt: u32) -> Duration {
        let exp = self.base_delay.saturating_mul(1 << attempt.min(20));
        let jitter_bound_ms = (self.base_delay.as_millis() / 2).max(1) as u64;
        let jitter = Duration::from_millis(rand::rng().random_range(0..jitter_bound_ms));
        (exp + jitter).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}

/// Outcome of one attempt, distinguishing errors worth retrying from fatal ones.
pub enum Attempt<T, E> {
    Success(T),
    Transient(E),
    Fatal(E),
}

/// Run `op` under `policy`, retrying transient failures with backoff.
///
/// `op` classifies its own failures via [`Attempt`]; non-transient failures
/// return immediately without consuming a retry. The loop is checked against
/// `cancel` both before each attempt and during the backoff wait.
///
/// # Errors
///
/// Returns the last error if all attempts are exhausted, or [`Cancelled`]
/// wrapped by the caller's error type via `on_cancel` if `cancel` fires.
pub async fn retry<T, E, Fut>(
    policy: RetryPolicy,
    cancel: &CancellationToken,
    on_cancel: impl Fn() -> E,
    mut op: impl FnMut() -> Fut,
) -> Result<T, E>
where
    Fut: Future<Output = Attempt<T, E>>,
{
    let mut attempt = 0u32;
    loop {
        if cancel.is_cancelled() {
            return Err(on_cancel());
        }

        match op().await {
            Attempt::Success(value) => return Ok(value),
            Attempt::Fatal(err) => return Err(err),
            Attempt::Transient(err) => {
                if attempt >= policy.max_retries {
                    return Err(err);
                }
                let wait = policy.backoff(attempt);
                attempt += 1;
                tokio::select! {
                    () = tokio::time::sleep(wait) => {}
                    () = cancel.cancelled() => return Err(on_cancel()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_transient_then_succeeds() {
        let calls = AtomicU32::new(0);
        let cancel = CancellationToken::new();
        let policy = RetryPolicy::new(2, Duration::from_millis(1));

        let result: Result<&str, &str> = retry(policy, &cancel, || "cancelled", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 { Attempt::Transient("503") } else { Attempt::Success("ok") }
            }
        })
        .await;

        assert_eq!(result, Ok("ok"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fatal_errors_never_retry() {
        let calls = AtomicU32::new(0);
        let cancel = CancellationToken::new();
        let policy = RetryPolicy::new(3, Duration::from_millis(1));

        let result: Result<&str, &str> = retry(policy, &cancel, || "cancelled", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Attempt::Fatal("bad request") }
        })
        .await;

        assert_eq!(result, Err("bad request"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausting_retries_returns_last_error() {
        let cancel = CancellationToken::new();
        let policy = RetryPolicy::new(2, Duration::from_millis(1));

        let result: Result<&str, &str> =
            retry(policy, &cancel, || "cancelled", || async { Attempt::Transient("503") }).await;

        assert_eq!(result, Err("503"));
    }

    #[tokio::test]
    async fn cancellation_short_circuits() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let policy = RetryPolicy::default();

        let result: Result<&str, &str> =
            retry(policy, &cancel, || "cancelled", || async { Attempt::Success("ok") }).await;

        assert_eq!(result, Err("cancelled"));
    }
}
