use crate::gateway::ApiError;
use std::future::Future;
use std::time::Duration;

/// Bounded retry with exponential backoff for requests a caller KNOWS to be idempotent.
///
/// Retrying is never applied implicitly. The gateway client performs every request exactly
/// once; a caller who wants retries wraps an idempotent read explicitly:
///
/// ```ignore
/// let status = RetryPolicy::default()
///     .run(gloo_timers::future::sleep, || gateway.health())
///     .await?;
/// ```
///
/// Only transient failures (see [`ApiError::is_transient`]) are retried. Client errors are
/// final, and `AuthRequired` is always surfaced immediately so the session manager stays in
/// charge of re-authentication. Mutations must not be wrapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,

    /// Delay before the first retry. Doubles on every subsequent retry.
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
        }
    }

    /// Backoff delay after the given zero-based attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.initial_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Run `op` until it succeeds, fails with a non-transient error or the attempt budget is
    /// exhausted. `sleep` is the timer of the caller's runtime, e.g.
    /// `gloo_timers::future::sleep` in the browser or `tokio::time::sleep` in native tests.
    pub async fn run<T, Op, OpFut, Sleep, SleepFut>(
        &self,
        sleep: Sleep,
        op: Op,
    ) -> Result<T, ApiError>
    where
        Op: Fn() -> OpFut,
        OpFut: Future<Output = Result<T, ApiError>>,
        Sleep: Fn(Duration) -> SleepFut,
        SleepFut: Future<Output = ()>,
    {
        let mut attempt: u32 = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt + 1 < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    tracing::debug!(?err, ?delay, attempt, "Transient failure. Retrying.");
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
