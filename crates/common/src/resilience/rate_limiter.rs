//! Fixed-window rate limiting with a bounded wait.
//!
//! Bounds outbound request rate: up to `max_requests` slots per rolling
//! window. [`RateLimiter::acquire`] waits for the window to roll when the
//! budget is spent, but never longer than `max_wait` — beyond that it fails
//! with a retry-after hint instead of queueing unboundedly.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::debug;

use crate::time::{Clock, SystemClock};

use super::ConfigError;

/// Error returned when a slot could not be acquired within the bounded wait.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateLimitError {
    #[error("rate limit exceeded, retry in {retry_after:?}")]
    WaitExceeded { retry_after: Duration },
}

/// Configuration for the fixed-window rate limiter
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Requests allowed per window
    pub max_requests: u32,
    /// Window length
    pub window: Duration,
    /// Maximum total time `acquire` may wait for a slot
    pub max_wait: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_requests: 30,
            window: Duration::from_secs(60),
            max_wait: Duration::from_secs(10),
        }
    }
}

impl RateLimiterConfig {
    pub fn builder() -> RateLimiterConfigBuilder {
        RateLimiterConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_requests == 0 {
            return Err(ConfigError::Invalid("max_requests must be greater than 0".into()));
        }
        if self.window.is_zero() {
            return Err(ConfigError::Invalid("window must be greater than zero".into()));
        }
        Ok(())
    }
}

/// Builder for [`RateLimiterConfig`]
#[derive(Debug, Default)]
pub struct RateLimiterConfigBuilder {
    config: RateLimiterConfig,
}

impl RateLimiterConfigBuilder {
    pub fn max_requests(mut self, max_requests: u32) -> Self {
        self.config.max_requests = max_requests;
        self
    }

    pub fn window(mut self, window: Duration) -> Self {
        self.config.window = window;
        self
    }

    pub fn max_wait(mut self, max_wait: Duration) -> Self {
        self.config.max_wait = max_wait;
        self
    }

    pub fn build(self) -> Result<RateLimiterConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[derive(Debug)]
struct WindowState {
    started: Instant,
    used: u32,
}

/// Fixed-window request limiter.
///
/// A slot is consumed only when it is granted, so a failed or abandoned
/// attempt never leaks budget.
pub struct RateLimiter<C: Clock = SystemClock> {
    config: RateLimiterConfig,
    window: Mutex<WindowState>,
    clock: C,
}

impl RateLimiter<SystemClock> {
    pub fn new(config: RateLimiterConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> RateLimiter<C> {
    /// Create a limiter with a custom clock (useful for testing).
    pub fn with_clock(config: RateLimiterConfig, clock: C) -> Result<Self, ConfigError> {
        config.validate()?;
        let started = clock.now();
        Ok(Self { config, window: Mutex::new(WindowState { started, used: 0 }), clock })
    }

    /// Try to consume one slot without waiting.
    pub fn try_acquire(&self) -> bool {
        let mut window = self.lock();
        self.roll(&mut window);
        if window.used < self.config.max_requests {
            window.used += 1;
            true
        } else {
            debug!(used = window.used, "rate limit budget spent for this window");
            false
        }
    }

    /// Time until a slot becomes available; zero when one is free now.
    pub fn next_slot_in(&self) -> Duration {
        let mut window = self.lock();
        self.roll(&mut window);
        if window.used < self.config.max_requests {
            Duration::ZERO
        } else {
            let elapsed = self.clock.now().duration_since(window.started);
            self.config.window.saturating_sub(elapsed)
        }
    }

    /// Consume one slot, waiting up to `max_wait` for the window to roll.
    ///
    /// Fails with [`RateLimitError::WaitExceeded`] (carrying the wait that
    /// would have been needed) rather than waiting past the bound.
    pub async fn acquire(&self) -> Result<(), RateLimitError> {
        let mut waited = Duration::ZERO;
        loop {
            if self.try_acquire() {
                return Ok(());
            }

            let wait = self.next_slot_in().max(Duration::from_millis(1));
            if waited + wait > self.config.max_wait {
                return Err(RateLimitError::WaitExceeded { retry_after: wait });
            }

            debug!(wait = ?wait, "waiting for a rate limit slot");
            tokio::time::sleep(wait).await;
            waited += wait;
        }
    }

    /// Slots still available in the current window.
    pub fn available(&self) -> u32 {
        let mut window = self.lock();
        self.roll(&mut window);
        self.config.max_requests - window.used
    }

    /// Roll the window forward when one or more window lengths elapsed.
    fn roll(&self, window: &mut WindowState) {
        let now = self.clock.now();
        let elapsed = now.duration_since(window.started);
        if elapsed >= self.config.window {
            let windows = elapsed.as_millis() / self.config.window.as_millis().max(1);
            window.started += self.config.window.saturating_mul(windows as u32);
            window.used = 0;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, WindowState> {
        self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
