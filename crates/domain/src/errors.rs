//! Error types used throughout the application
//!
//! Every failure crossing the portal boundary is classified into the closed
//! `PortalError` taxonomy so that retry and circuit-breaker logic operate on
//! a fixed set of cases instead of raw transport errors.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main failure taxonomy for portal operations.
///
/// Exactly one variant per recovery strategy:
/// - `SessionExpired`: a previously-live session was rejected mid-use;
///   recoverable by re-authenticating on the next attempt.
/// - `RateLimited`: the upstream (or the local limiter) signaled throttling;
///   recoverable after the `retry_after` hint elapses.
/// - `Connection`: network or transport failure, including circuit-open
///   fast-fails; recoverable with backoff.
/// - `Unknown`: uncategorized upstream failure; surfaced without extra
///   retries beyond the default policy.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum PortalError {
    #[error("session expired: {0}")]
    SessionExpired(String),

    #[error("rate limited: {message}")]
    RateLimited {
        message: String,
        /// Recommended wait in seconds before the next attempt, when the
        /// upstream or the local limiter provided one.
        retry_after: Option<u64>,
    },

    #[error("connection error: {0}")]
    Connection(String),

    #[error("portal error: {0}")]
    Unknown(String),
}

impl PortalError {
    /// Convenience constructor for throttling failures.
    pub fn rate_limited(message: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Self::RateLimited {
            message: message.into(),
            retry_after: retry_after.map(|d| d.as_secs().max(1)),
        }
    }

    /// Returns true if this failure should be retried locally with backoff.
    ///
    /// `SessionExpired` is not transient here: it is handled by a dedicated
    /// re-authentication path, not by blind retries.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Connection(_))
    }

    /// Recommended wait before the next attempt, where applicable.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => retry_after.map(Duration::from_secs),
            _ => None,
        }
    }
}

/// Result type alias for portal operations
pub type Result<T> = std::result::Result<T, PortalError>;
