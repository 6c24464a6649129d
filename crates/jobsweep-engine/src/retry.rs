//! Bounded retry with exponential backoff and failure classification.
//!
//! Every retryable platform operation (authenticate, search, apply) runs
//! through [`RetryPolicy::run`]. The policy consults [`Classify`] on each
//! failure: `Fatal` aborts immediately, `Transient` and `Detection` retry
//! with exponential backoff, and `Detection` failures are weighted toward
//! longer waits so the scheduler backs off harder when a platform pushes
//! back.

use futures::future::BoxFuture;
use jobsweep_core::{Classify, FailureClass};
use rand::Rng;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Default attempt ceiling per operation.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base backoff delay.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(2);

/// Default backoff cap.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);

/// Retry scheduling parameters.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts per operation, including the first
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Exponential growth factor per failed attempt
    pub multiplier: f64,
    /// Upper bound on the computed (pre-jitter) delay
    pub max_delay: Duration,
    /// Add up to half the computed delay as random jitter
    pub jitter: bool,
    /// Extra multiplier applied when the failure is a detection signal
    pub detection_weight: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            multiplier: 2.0,
            max_delay: DEFAULT_MAX_DELAY,
            jitter: true,
            detection_weight: 3,
        }
    }
}

/// Terminal outcome of a retried operation.
#[derive(Error, Debug)]
pub enum RetryError<E> {
    /// The operation failed with a non-retryable error
    #[error("fatal failure after {attempts} attempt(s): {error}")]
    Fatal {
        /// The underlying error
        error: E,
        /// Attempts consumed, including the failing one
        attempts: u32,
    },

    /// The attempt ceiling was reached without success
    #[error("retries exhausted after {attempts} attempt(s): {error}")]
    Exhausted {
        /// The error from the final attempt
        error: E,
        /// Attempts consumed
        attempts: u32,
    },
}

impl<E> RetryError<E> {
    /// The underlying error from the final attempt.
    pub fn into_inner(self) -> E {
        match self {
            Self::Fatal { error, .. } | Self::Exhausted { error, .. } => error,
        }
    }

    /// Attempts consumed before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Fatal { attempts, .. } | Self::Exhausted { attempts, .. } => *attempts,
        }
    }
}

impl RetryPolicy {
    /// Run `op` against `ctx` until it succeeds, fails fatally, or the
    /// attempt ceiling is reached.
    ///
    /// `op` is re-invoked with a fresh mutable borrow of `ctx` on every
    /// attempt, which lets callers retry `&mut self` adapter methods.
    /// `observe` is called once per attempt with the 1-based attempt
    /// number and the attempt's result, before any backoff sleep; it is
    /// how the orchestrator builds its attempt log.
    pub async fn run<Ctx, T, E, F>(
        &self,
        label: &str,
        ctx: &mut Ctx,
        mut op: F,
        mut observe: impl FnMut(u32, Result<(), &E>),
    ) -> Result<T, RetryError<E>>
    where
        Ctx: ?Sized,
        E: Classify + fmt::Display,
        F: for<'c> FnMut(&'c mut Ctx) -> BoxFuture<'c, Result<T, E>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op(ctx).await {
                Ok(value) => {
                    observe(attempt, Ok(()));
                    return Ok(value);
                }
                Err(error) => {
                    observe(attempt, Err(&error));
                    let class = error.class();
                    if class == FailureClass::Fatal {
                        return Err(RetryError::Fatal { error, attempts: attempt });
                    }
                    if attempt >= max_attempts {
                        return Err(RetryError::Exhausted { error, attempts: attempt });
                    }
                    let wait = self.backoff_delay(attempt, class == FailureClass::Detection);
                    warn!(
                        op = label,
                        attempt,
                        max_attempts,
                        wait_ms = wait.as_millis() as u64,
                        error = %error,
                        "attempt failed, backing off"
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// Delay before the retry that follows failed attempt `attempt`
    /// (1-based).
    ///
    /// Grows exponentially with the attempt number, is weighted by
    /// `detection_weight` for detection signals, and is capped at
    /// `max_delay` before jitter is added.
    pub fn backoff_delay(&self, attempt: u32, detection: bool) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let mut wait = self.base_delay.mul_f64(self.multiplier.powi(exponent as i32));
        if detection {
            wait = wait.saturating_mul(self.detection_weight.max(1));
        }
        if wait > self.max_delay {
            wait = self.max_delay;
        }
        if self.jitter && !wait.is_zero() {
            let jitter_ns = rand::thread_rng().gen_range(0..=wait.as_nanos() / 2) as u64;
            wait += Duration::from_nanos(jitter_ns);
        }
        wait
    }
}
