use std::future::Future;
use std::time::Duration;

use crate::{FlowError, FlowResult, Pacer, PauseKind};

/// Bounded-retry configuration with capped exponential backoff.
///
/// Immutable per invocation; callers that want different behavior build a new
/// policy rather than mutating a shared one.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub backoff_multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_millis(10_000),
        }
    }
}

impl RetryPolicy {
    /// A policy that gives up after the first failure.
    pub fn no_retries() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Backoff to apply after failed attempt `attempt` (1-based):
    /// `min(initial * multiplier^(attempt-1), max_delay)`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
        let scaled = self.initial_delay.mul_f64(factor.max(0.0));
        scaled.min(self.max_delay)
    }
}

/// Runs `action` up to `policy.max_attempts` times, sequentially, suspending
/// between attempts through `pacer`.
///
/// Returns the first success immediately; after the final failure the last
/// error is returned, never dropped and never re-raised. The executor imposes
/// no timeout of its own — actions are responsible for bounding themselves.
/// Side effects of failed attempts are not rolled back, so actions must be
/// safe to repeat.
pub async fn run_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    pacer: &dyn Pacer,
    mut action: F,
) -> FlowResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = FlowResult<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = FlowError::new("retry executor ran zero attempts");

    for attempt in 1..=max_attempts {
        match action().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                last_error = err;
                if attempt == max_attempts {
                    break;
                }
                pacer
                    .pause(PauseKind::Backoff, policy.delay_after(attempt))
                    .await;
            }
        }
    }

    Err(last_error)
}
