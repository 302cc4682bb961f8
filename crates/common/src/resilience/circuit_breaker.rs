//! Circuit breaker tracking consecutive failures across poll cycles.
//!
//! State machine:
//! - `Closed` (initial): calls pass through; each failure increments the
//!   failure counter. Reaching the threshold opens the circuit.
//! - `Open`: calls fail immediately without touching the upstream until the
//!   cooldown elapses, then the breaker moves to `HalfOpen`.
//! - `HalfOpen`: exactly one probe call is admitted. Success closes the
//!   circuit and resets the counter; failure re-opens it and restarts the
//!   cooldown.

use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::time::{Clock, SystemClock};

use super::ConfigError;

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Circuit is closed, allowing requests
    Closed,
    /// Circuit is open, rejecting requests
    Open,
    /// Circuit is half-open, allowing a single probe
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => f.write_str("closed"),
            CircuitState::Open => f.write_str("open"),
            CircuitState::HalfOpen => f.write_str("half_open"),
        }
    }
}

/// Error returned while the circuit rejects calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BreakerError {
    #[error("circuit breaker is open, retry in {retry_in:?}")]
    Open { retry_in: Duration },
}

/// Configuration for circuit breaker behavior
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Failures before opening the circuit
    pub failure_threshold: u32,
    /// Time to wait before admitting a probe
    pub cooldown: Duration,
    /// Whether a success while closed resets the failure counter.
    ///
    /// Off by default: a client multiplexing several logical operations
    /// would otherwise mask a persistently failing operation behind the
    /// successes of its neighbors. The counter always resets when a
    /// half-open probe succeeds.
    pub reset_on_success: bool,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self { failure_threshold: 5, cooldown: Duration::from_secs(300), reset_on_success: false }
    }
}

impl CircuitBreakerConfig {
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.failure_threshold == 0 {
            return Err(ConfigError::Invalid("failure_threshold must be greater than 0".into()));
        }
        Ok(())
    }
}

/// Builder for [`CircuitBreakerConfig`]
#[derive(Debug, Default)]
pub struct CircuitBreakerConfigBuilder {
    config: CircuitBreakerConfig,
}

impl CircuitBreakerConfigBuilder {
    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.config.failure_threshold = threshold;
        self
    }

    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.config.cooldown = cooldown;
        self
    }

    pub fn reset_on_success(mut self, reset: bool) -> Self {
        self.config.reset_on_success = reset;
        self
    }

    pub fn build(self) -> Result<CircuitBreakerConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failures: u32,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
}

/// Circuit breaker with a single-probe half-open state.
///
/// The caller acquires a permit with [`try_acquire`](Self::try_acquire),
/// runs the operation, and reports the outcome with
/// [`record_success`](Self::record_success) /
/// [`record_failure`](Self::record_failure).
pub struct CircuitBreaker<C: Clock = SystemClock> {
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerInner>,
    clock: C,
}

impl CircuitBreaker<SystemClock> {
    pub fn new(config: CircuitBreakerConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> CircuitBreaker<C> {
    /// Create a breaker with a custom clock (useful for testing).
    pub fn with_clock(config: CircuitBreakerConfig, clock: C) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failures: 0,
                opened_at: None,
                probe_in_flight: false,
            }),
            clock,
        })
    }

    /// Request permission to run one operation.
    ///
    /// While open, returns [`BreakerError::Open`] with the remaining
    /// cooldown; once the cooldown elapses the call transitions the breaker
    /// to half-open and admits a single probe.
    pub fn try_acquire(&self) -> Result<(), BreakerError> {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open => {
                let elapsed = inner
                    .opened_at
                    .map(|at| self.clock.now().duration_since(at))
                    .unwrap_or(Duration::ZERO);
                if elapsed >= self.config.cooldown {
                    debug!("circuit breaker cooldown elapsed, admitting probe");
                    inner.state = CircuitState::HalfOpen;
                    inner.probe_in_flight = true;
                    Ok(())
                } else {
                    Err(BreakerError::Open {
                        retry_in: self.config.cooldown.saturating_sub(elapsed),
                    })
                }
            }
            CircuitState::HalfOpen => {
                if inner.probe_in_flight {
                    Err(BreakerError::Open { retry_in: self.config.cooldown })
                } else {
                    inner.probe_in_flight = true;
                    Ok(())
                }
            }
        }
    }

    /// Record a successful operation.
    ///
    /// A successful half-open probe closes the circuit and resets the
    /// counter. While closed, the counter is reset only when
    /// `reset_on_success` is enabled.
    pub fn record_success(&self) {
        let mut inner = self.lock();
        inner.probe_in_flight = false;
        if inner.state != CircuitState::Closed {
            info!(state = %inner.state, "circuit breaker closing after success");
            inner.state = CircuitState::Closed;
            inner.opened_at = None;
            inner.failures = 0;
        } else if self.config.reset_on_success {
            inner.failures = 0;
        }
    }

    /// Record a failed operation.
    pub fn record_failure(&self) {
        let mut inner = self.lock();
        inner.probe_in_flight = false;
        inner.failures += 1;
        let now = self.clock.now();

        match inner.state {
            CircuitState::Closed => {
                if inner.failures >= self.config.failure_threshold {
                    warn!(
                        failures = inner.failures,
                        "circuit breaker opening after consecutive failures"
                    );
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(now);
                }
            }
            CircuitState::HalfOpen => {
                warn!("circuit breaker probe failed, re-opening");
                inner.state = CircuitState::Open;
                inner.opened_at = Some(now);
            }
            CircuitState::Open => {
                inner.opened_at = Some(now);
            }
        }
    }

    /// Current state, without triggering transitions.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Current failure count.
    pub fn failure_count(&self) -> u32 {
        self.lock().failures
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: Clock> fmt::Debug for CircuitBreaker<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("failure_count", &self.failure_count())
            .finish()
    }
}
