//! Resilience patterns for fault tolerance.
//!
//! Three generic, domain-free primitives:
//! - **Circuit breaker**: stops hammering an upstream that keeps failing,
//!   bounding the cost of a dead connection to one probe per cooldown.
//! - **Retry executor**: classification-driven retries with exponential
//!   backoff and jitter.
//! - **Rate limiter**: fixed-window request budget with a bounded wait.
//!
//! All three are generic over error types and parameterized on
//! [`crate::time::Clock`] so state transitions can be tested with
//! [`crate::time::MockClock`] instead of real delays.

pub mod circuit_breaker;
pub mod rate_limiter;
pub mod retry;

use thiserror::Error;

/// Configuration validation error shared by the resilience builders.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub use circuit_breaker::{BreakerError, CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use rate_limiter::{RateLimitError, RateLimiter, RateLimiterConfig};
pub use retry::{RetryConfig, RetryDecision, RetryError, RetryExecutor, RetryPolicy};
