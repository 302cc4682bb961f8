//! Classification-driven retry with exponential backoff and jitter.
//!
//! The executor knows nothing about error semantics: a [`RetryPolicy`]
//! classifies each failure into retry/stop, which keeps the retry loop
//! operating on a closed set of cases decided at the call boundary.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tracing::{debug, warn};

use super::ConfigError;

/// Errors surfaced by the retry executor.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// Every attempt failed with a transient error.
    #[error("all {attempts} attempts failed")]
    Exhausted {
        attempts: u32,
        #[source]
        source: E,
    },

    /// The operation failed with an error classified as permanent; it was
    /// not retried.
    #[error("operation failed with a permanent error")]
    Permanent {
        #[source]
        source: E,
    },
}

impl<E> RetryError<E> {
    /// The underlying failure, regardless of how the executor gave up.
    pub fn into_source(self) -> E {
        match self {
            Self::Exhausted { source, .. } | Self::Permanent { source } => source,
        }
    }
}

/// Decision for one failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry with the default backoff delay
    Retry,
    /// Retry after a specific delay (e.g. an upstream retry-after hint)
    RetryAfter(Duration),
    /// Permanent failure, surface immediately
    Stop,
}

/// Classifies failures into transient and permanent.
pub trait RetryPolicy<E> {
    fn classify(&self, error: &E, attempt: u32) -> RetryDecision;
}

impl<E, F> RetryPolicy<E> for F
where
    F: Fn(&E, u32) -> RetryDecision,
{
    fn classify(&self, error: &E, attempt: u32) -> RetryDecision {
        self(error, attempt)
    }
}

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total invocation budget, including the first attempt
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Cap applied to every delay, including retry-after hints
    pub max_delay: Duration,
    /// Proportional jitter in `[0, 1]`; each delay is scaled by a random
    /// factor in `[1 - jitter_ratio, 1 + jitter_ratio]`
    pub jitter_ratio: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            jitter_ratio: 0.25,
        }
    }
}

impl RetryConfig {
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid("max_attempts must be greater than 0".into()));
        }
        if !(0.0..=1.0).contains(&self.jitter_ratio) {
            return Err(ConfigError::Invalid("jitter_ratio must be within [0, 1]".into()));
        }
        if self.base_delay > self.max_delay {
            return Err(ConfigError::Invalid("base_delay must not exceed max_delay".into()));
        }
        Ok(())
    }
}

/// Builder for [`RetryConfig`]
#[derive(Debug, Default)]
pub struct RetryConfigBuilder {
    config: RetryConfig,
}

impl RetryConfigBuilder {
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.config.base_delay = delay;
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.config.max_delay = delay;
        self
    }

    pub fn jitter_ratio(mut self, ratio: f64) -> Self {
        self.config.jitter_ratio = ratio;
        self
    }

    pub fn build(self) -> Result<RetryConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Executes an async operation under a retry policy.
pub struct RetryExecutor<P> {
    config: RetryConfig,
    policy: P,
}

impl<P> RetryExecutor<P> {
    pub fn new(config: RetryConfig, policy: P) -> Self {
        Self { config, policy }
    }

    /// Run `operation`, retrying transient failures.
    ///
    /// Permanent failures surface after exactly one invocation; transient
    /// failures are retried with exponential backoff until the attempt
    /// budget is exhausted, at which point the last failure is surfaced.
    pub async fn execute<F, Fut, T, E>(&self, mut operation: F) -> Result<T, RetryError<E>>
    where
        P: RetryPolicy<E>,
        E: fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "operation succeeded after retries");
                    }
                    return Ok(value);
                }
                Err(error) => {
                    if attempt >= self.config.max_attempts {
                        warn!(attempts = attempt, error = %error, "retry budget exhausted");
                        return Err(RetryError::Exhausted { attempts: attempt, source: error });
                    }

                    let delay = match self.policy.classify(&error, attempt) {
                        RetryDecision::Stop => {
                            debug!(error = %error, "failure classified as permanent");
                            return Err(RetryError::Permanent { source: error });
                        }
                        RetryDecision::Retry => self.jittered(self.backoff_delay(attempt - 1)),
                        RetryDecision::RetryAfter(hint) => hint.min(self.config.max_delay),
                    };

                    warn!(attempt, delay = ?delay, error = %error, "retrying after failure");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Pre-jitter delay before retry number `retry` (0-based):
    /// `base_delay * 2^retry`, capped at `max_delay`.
    fn backoff_delay(&self, retry: u32) -> Duration {
        let factor = 1u64 << retry.min(20);
        self.config.base_delay.saturating_mul(factor as u32).min(self.config.max_delay)
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if self.config.jitter_ratio == 0.0 {
            return delay;
        }
        let ratio = self.config.jitter_ratio;
        let factor = rand::thread_rng().gen_range(1.0 - ratio..=1.0 + ratio);
        delay.mul_f64(factor).min(self.config.max_delay)
    }
}
