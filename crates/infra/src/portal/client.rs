//! The resilient portal client.
//!
//! Implements the session-free [`PortalGateway`] port by composing, in
//! order: rate-limiter acquisition, the circuit-breaker gate, session
//! acquisition, and the retry executor around the raw capability call.
//! This is the single choke point between the pipeline and the upstream;
//! no other component talks to the portal.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use cartable_common::{
    CircuitBreaker, CircuitBreakerConfig, CircuitState, Clock, RateLimiter, RateLimiterConfig,
    RetryConfig, RetryExecutor, SystemClock,
};
use cartable_core::ports::{PortalClient, PortalGateway};
use cartable_domain::{
    Absence, CartableConfig, ConfigError, Credentials, DateRange, Delay, Evaluation, Grade,
    Lesson, MenuDay, Period, PortalError, Result, Session,
};
use tracing::warn;

use super::errors::{classify_breaker, classify_rate_limit, classify_retry, TransiencePolicy};
use super::session::SessionManager;

/// Session-aware client wrapper with retries, rate limiting, and a circuit
/// breaker around a raw [`PortalClient`] capability.
pub struct ResilientPortalClient<C: Clock = SystemClock> {
    raw: Arc<dyn PortalClient>,
    sessions: Arc<SessionManager>,
    limiter: RateLimiter<C>,
    breaker: CircuitBreaker<C>,
    retries: RetryExecutor<TransiencePolicy>,
}

impl ResilientPortalClient<SystemClock> {
    pub fn new(
        raw: Arc<dyn PortalClient>,
        credentials: Credentials,
        config: &CartableConfig,
    ) -> std::result::Result<Self, ConfigError> {
        Self::with_clock(raw, credentials, config, SystemClock)
    }
}

impl<C: Clock + Clone> ResilientPortalClient<C> {
    /// Build a client with a custom clock driving the limiter and breaker
    /// (useful for testing).
    pub fn with_clock(
        raw: Arc<dyn PortalClient>,
        credentials: Credentials,
        config: &CartableConfig,
        clock: C,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;

        let limiter_config = RateLimiterConfig::builder()
            .max_requests(config.rate_limit.max_requests)
            .window(config.rate_limit.window())
            .max_wait(config.rate_limit.max_wait())
            .build()
            .map_err(invalid)?;
        let limiter = RateLimiter::with_clock(limiter_config, clock.clone()).map_err(invalid)?;

        let breaker_config = CircuitBreakerConfig::builder()
            .failure_threshold(config.circuit_breaker.failure_threshold)
            .cooldown(config.circuit_breaker.cooldown())
            .build()
            .map_err(invalid)?;
        let breaker = CircuitBreaker::with_clock(breaker_config, clock).map_err(invalid)?;

        let retry_config = RetryConfig::builder()
            .max_attempts(config.retry.max_attempts)
            .base_delay(config.retry.base_delay())
            .max_delay(config.retry.max_delay())
            .jitter_ratio(config.retry.jitter_ratio)
            .build()
            .map_err(invalid)?;
        let retries = RetryExecutor::new(retry_config, TransiencePolicy);

        let sessions = Arc::new(SessionManager::new(Arc::clone(&raw), credentials, &config.session));

        Ok(Self { raw, sessions, limiter, breaker, retries })
    }

    /// Current breaker state, for diagnostics.
    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }

    pub fn session_manager(&self) -> &SessionManager {
        &self.sessions
    }

    /// Run one logical upstream operation through the full resilience
    /// composition.
    ///
    /// An upstream `SessionExpired` invalidates the stored session and is
    /// retried exactly once against a freshly authenticated session; all
    /// other failures go through the transience policy.
    async fn call<T, F, Fut>(&self, op: &'static str, run: F) -> Result<T>
    where
        F: Fn(Session) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.limiter.acquire().await.map_err(classify_rate_limit)?;
        self.breaker.try_acquire().map_err(classify_breaker)?;

        let run = Arc::new(run);
        let sessions = Arc::clone(&self.sessions);
        let attempt = move || {
            let run = Arc::clone(&run);
            let sessions = Arc::clone(&sessions);
            async move {
                let session = sessions.ensure_session().await?;
                match (*run)(session).await {
                    Err(PortalError::SessionExpired(reason)) => {
                        warn!(op, reason = %reason, "session rejected mid-use, re-authenticating");
                        sessions.invalidate().await;
                        let session = sessions.ensure_session().await?;
                        (*run)(session).await
                    }
                    other => other,
                }
            }
        };

        match self.retries.execute(attempt).await {
            Ok(value) => {
                self.breaker.record_success();
                Ok(value)
            }
            Err(error) => {
                self.breaker.record_failure();
                let error = classify_retry(error);
                warn!(op, error = %error, "portal operation failed terminally");
                Err(error)
            }
        }
    }
}

fn invalid(err: cartable_common::ConfigError) -> ConfigError {
    ConfigError::Invalid(err.to_string())
}

#[async_trait]
impl<C: Clock + Clone> PortalGateway for ResilientPortalClient<C> {
    async fn periods(&self) -> Result<Vec<Period>> {
        let raw = Arc::clone(&self.raw);
        self.call("list_periods", move |session| {
            let raw = Arc::clone(&raw);
            async move { raw.list_periods(&session).await }
        })
        .await
    }

    async fn grades(&self, period: &Period) -> Result<Vec<Grade>> {
        let raw = Arc::clone(&self.raw);
        let period = period.clone();
        self.call("fetch_grades", move |session| {
            let raw = Arc::clone(&raw);
            let period = period.clone();
            async move { raw.fetch_grades(&session, &period).await }
        })
        .await
    }

    async fn evaluations(&self, period: &Period) -> Result<Vec<Evaluation>> {
        let raw = Arc::clone(&self.raw);
        let period = period.clone();
        self.call("fetch_evaluations", move |session| {
            let raw = Arc::clone(&raw);
            let period = period.clone();
            async move { raw.fetch_evaluations(&session, &period).await }
        })
        .await
    }

    async fn absences(&self, period: &Period) -> Result<Vec<Absence>> {
        let raw = Arc::clone(&self.raw);
        let period = period.clone();
        self.call("fetch_absences", move |session| {
            let raw = Arc::clone(&raw);
            let period = period.clone();
            async move { raw.fetch_absences(&session, &period).await }
        })
        .await
    }

    async fn delays(&self, period: &Period) -> Result<Vec<Delay>> {
        let raw = Arc::clone(&self.raw);
        let period = period.clone();
        self.call("fetch_delays", move |session| {
            let raw = Arc::clone(&raw);
            let period = period.clone();
            async move { raw.fetch_delays(&session, &period).await }
        })
        .await
    }

    async fn menus(&self, range: DateRange) -> Result<Vec<MenuDay>> {
        let raw = Arc::clone(&self.raw);
        self.call("fetch_menus", move |session| {
            let raw = Arc::clone(&raw);
            async move { raw.fetch_menus(&session, range).await }
        })
        .await
    }

    async fn timetable(&self, range: DateRange) -> Result<Vec<Lesson>> {
        let raw = Arc::clone(&self.raw);
        self.call("fetch_timetable", move |session| {
            let raw = Arc::clone(&raw);
            async move { raw.fetch_timetable(&session, range).await }
        })
        .await
    }
}
