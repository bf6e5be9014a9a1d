//! Retry policy with exponential backoff.

use std::num::NonZeroU32;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tracing::debug;

/// Attempt budget and base delay shared by the asset and secret retry loops.
///
/// Attempt `i` (0-indexed) waits `base_delay * 2^i` before attempt `i + 1`.
/// The final attempt's failure is terminal and is not followed by a wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: NonZeroU32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy from an attempt budget and base delay.
    #[must_use]
    pub const fn new(max_attempts: NonZeroU32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Policy that tries exactly once and never sleeps.
    #[must_use]
    pub const fn once() -> Self {
        Self::new(NonZeroU32::MIN, Duration::ZERO)
    }

    /// Returns the total number of attempts.
    #[must_use]
    pub const fn max_attempts(self) -> u32 {
        self.max_attempts.get()
    }

    /// Returns the delay applied after the first failed attempt.
    #[must_use]
    pub const fn base_delay(self) -> Duration {
        self.base_delay
    }

    /// Delay to wait after the failed attempt `attempt` (0-indexed).
    #[must_use]
    pub fn backoff(self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2_u32.saturating_pow(attempt))
    }

    /// Runs `op` until it succeeds or the attempt budget is spent.
    ///
    /// `op` receives the 0-indexed attempt number.
    ///
    /// # Errors
    ///
    /// Returns [`Exhausted`] carrying the last failure once every attempt has
    /// failed.
    pub fn run<T, E>(
        self,
        sleeper: &dyn Sleeper,
        mut op: impl FnMut(u32) -> Result<T, E>,
    ) -> Result<Retried<T>, Exhausted<E>> {
        let max_attempts = self.max_attempts();
        let mut attempt = 0;

        loop {
            match op(attempt) {
                Ok(value) => {
                    return Ok(Retried {
                        value,
                        attempts: attempt + 1,
                    });
                }
                Err(last) if attempt + 1 >= max_attempts => {
                    return Err(Exhausted {
                        last,
                        attempts: attempt + 1,
                    });
                }
                Err(_) => {
                    let delay = self.backoff(attempt);
                    debug!(
                        attempt = attempt + 1,
                        max_attempts,
                        ?delay,
                        "attempt failed; backing off"
                    );
                    sleeper.sleep(delay);
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(NonZeroU32::MIN.saturating_add(2), Duration::from_secs(1))
    }
}

/// Successful outcome of [`RetryPolicy::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct Retried<T> {
    /// Value produced by the successful attempt.
    pub value: T,
    /// Attempts consumed, including the successful one.
    pub attempts: u32,
}

impl<T> Retried<T> {
    /// Number of backoff sleeps that preceded success.
    #[must_use]
    pub fn retries(&self) -> u32 {
        self.attempts - 1
    }
}

/// Terminal failure of [`RetryPolicy::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct Exhausted<E> {
    /// Failure reported by the final attempt.
    pub last: E,
    /// Attempts consumed; always equals the policy's budget.
    pub attempts: u32,
}

/// Blocks the caller between attempts.
pub trait Sleeper: Send + Sync {
    /// Waits for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Sleeps the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Records requested delays without blocking.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the delays requested so far, in order.
    #[must_use]
    pub fn delays(&self) -> Vec<Duration> {
        self.delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(duration);
    }
}
