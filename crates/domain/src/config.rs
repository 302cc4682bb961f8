//! Configuration structures for the polling pipeline.
//!
//! Every section has sensible defaults (see [`crate::constants`]) so a host
//! can run with an empty configuration file. Durations are plain seconds or
//! milliseconds fields to keep the on-disk format trivial.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::*;

/// Configuration loading/validation error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Invalid(String),

    #[error("configuration not found: {0}")]
    NotFound(String),

    #[error("configuration parse error: {0}")]
    Parse(String),
}

/// Top-level configuration for one coordinator instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CartableConfig {
    pub poll: PollSettings,
    pub rate_limit: RateLimitSettings,
    pub retry: RetrySettings,
    pub circuit_breaker: BreakerSettings,
    pub session: SessionSettings,
    pub tracking: TrackingSettings,
}

impl CartableConfig {
    /// Validate every section, reporting the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.poll.validate()?;
        self.rate_limit.validate()?;
        self.retry.validate()?;
        self.circuit_breaker.validate()?;
        self.session.validate()?;
        self.tracking.validate()
    }
}

/// Poll cadence and cycle bounds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PollSettings {
    /// Seconds between cycle starts.
    pub interval_secs: u64,
    /// Whole-cycle timeout; an elapsed cycle is abandoned and reported as a
    /// connection-class failure.
    pub cycle_timeout_secs: u64,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            cycle_timeout_secs: DEFAULT_CYCLE_TIMEOUT_SECS,
        }
    }
}

impl PollSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn cycle_timeout(&self) -> Duration {
        Duration::from_secs(self.cycle_timeout_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_secs == 0 {
            return Err(ConfigError::Invalid("poll.interval_secs must be greater than 0".into()));
        }
        if self.cycle_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "poll.cycle_timeout_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Outbound request budget.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RateLimitSettings {
    pub max_requests: u32,
    pub window_secs: u64,
    pub max_wait_secs: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_RATE_LIMIT_MAX_REQUESTS,
            window_secs: DEFAULT_RATE_LIMIT_WINDOW_SECS,
            max_wait_secs: DEFAULT_RATE_LIMIT_MAX_WAIT_SECS,
        }
    }
}

impl RateLimitSettings {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_requests == 0 {
            return Err(ConfigError::Invalid(
                "rate_limit.max_requests must be greater than 0".into(),
            ));
        }
        if self.window_secs == 0 {
            return Err(ConfigError::Invalid("rate_limit.window_secs must be greater than 0".into()));
        }
        Ok(())
    }
}

/// Retry policy knobs for one logical upstream operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Proportional jitter in `[0, 1]` applied to each backoff delay.
    pub jitter_ratio: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RETRY_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_RETRY_MAX_DELAY_MS,
            jitter_ratio: DEFAULT_RETRY_JITTER_RATIO,
        }
    }
}

impl RetrySettings {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid("retry.max_attempts must be greater than 0".into()));
        }
        if !(0.0..=1.0).contains(&self.jitter_ratio) {
            return Err(ConfigError::Invalid("retry.jitter_ratio must be within [0, 1]".into()));
        }
        if self.base_delay_ms > self.max_delay_ms {
            return Err(ConfigError::Invalid(
                "retry.base_delay_ms must not exceed retry.max_delay_ms".into(),
            ));
        }
        Ok(())
    }
}

/// Circuit breaker thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BreakerSettings {
    pub failure_threshold: u32,
    pub cooldown_secs: u64,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_BREAKER_FAILURE_THRESHOLD,
            cooldown_secs: DEFAULT_BREAKER_COOLDOWN_SECS,
        }
    }
}

impl BreakerSettings {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.failure_threshold == 0 {
            return Err(ConfigError::Invalid(
                "circuit_breaker.failure_threshold must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Session reuse policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionSettings {
    /// Window within which a session is reused without a liveness probe.
    pub freshness_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self { freshness_secs: DEFAULT_SESSION_FRESHNESS_SECS }
    }
}

impl SessionSettings {
    pub fn freshness(&self) -> Duration {
        Duration::from_secs(self.freshness_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }
}

/// How much of the portal's data one cycle tracks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrackingSettings {
    /// Current period plus preceding ones, newest first.
    pub max_tracked_periods: usize,
    pub grades_display_limit: usize,
    pub evaluations_display_limit: usize,
    pub menu_days: u32,
    pub timetable_days: u32,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            max_tracked_periods: DEFAULT_MAX_TRACKED_PERIODS,
            grades_display_limit: DEFAULT_GRADES_DISPLAY_LIMIT,
            evaluations_display_limit: DEFAULT_EVALUATIONS_DISPLAY_LIMIT,
            menu_days: DEFAULT_MENU_DAYS,
            timetable_days: DEFAULT_TIMETABLE_DAYS,
        }
    }
}

impl TrackingSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_tracked_periods == 0 {
            return Err(ConfigError::Invalid(
                "tracking.max_tracked_periods must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
