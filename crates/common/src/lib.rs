//! Shared, domain-free building blocks for Cartable.
//!
//! Two modules:
//! - [`time`]: a small clock abstraction so every time-dependent component
//!   can be driven deterministically in tests.
//! - [`resilience`]: circuit breaker, retry executor, and rate limiter used
//!   by the portal client.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod resilience;
pub mod time;

// Re-export commonly used types for convenience
pub use resilience::{
    BreakerError, CircuitBreaker, CircuitBreakerConfig, CircuitState, ConfigError, RateLimitError,
    RateLimiter, RateLimiterConfig, RetryConfig, RetryDecision, RetryError, RetryExecutor,
    RetryPolicy,
};
pub use time::{Clock, MockClock, SystemClock};
