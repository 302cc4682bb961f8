//! Classification of resilience-layer failures into the portal taxonomy.
//!
//! The resilient client is the boundary where every failure becomes a
//! `PortalError`; nothing above it ever sees a limiter, breaker, or retry
//! error type.

use cartable_common::{BreakerError, RateLimitError, RetryDecision, RetryError, RetryPolicy};
use cartable_domain::PortalError;

/// Map a local rate-limiter rejection onto the throttling variant, keeping
/// the wait the limiter would have needed as the retry-after hint.
pub fn classify_rate_limit(err: RateLimitError) -> PortalError {
    match err {
        RateLimitError::WaitExceeded { retry_after } => {
            PortalError::rate_limited("local rate limit exceeded", Some(retry_after))
        }
    }
}

/// Map a circuit-open fast-fail onto the connection class, per the
/// taxonomy: the upstream is deemed unhealthy, not throttling us.
pub fn classify_breaker(err: BreakerError) -> PortalError {
    match err {
        BreakerError::Open { retry_in } => PortalError::Connection(format!(
            "circuit breaker open, retry in {}s",
            retry_in.as_secs().max(1)
        )),
    }
}

/// Unwrap the retry executor's verdict back into the underlying failure.
///
/// On exhaustion the last failure is surfaced; a permanent classification
/// surfaces the failure untouched.
pub fn classify_retry(err: RetryError<PortalError>) -> PortalError {
    err.into_source()
}

/// Retry classification over the portal taxonomy.
///
/// `RateLimited` honors the upstream retry-after hint when present;
/// `Connection` retries with the default backoff; `SessionExpired` and
/// `Unknown` are permanent for the executor (session expiry has its own
/// re-authentication path in the client).
#[derive(Debug, Clone, Copy, Default)]
pub struct TransiencePolicy;

impl RetryPolicy<PortalError> for TransiencePolicy {
    fn classify(&self, error: &PortalError, _attempt: u32) -> RetryDecision {
        match error {
            PortalError::RateLimited { .. } => match error.retry_after() {
                Some(hint) => RetryDecision::RetryAfter(hint),
                None => RetryDecision::Retry,
            },
            PortalError::Connection(_) => RetryDecision::Retry,
            PortalError::SessionExpired(_) | PortalError::Unknown(_) => RetryDecision::Stop,
        }
    }
}
