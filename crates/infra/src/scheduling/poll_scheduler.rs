//! Poll scheduler driving the coordinator on a fixed interval.
//!
//! Single-flight by construction: the loop awaits each cycle to completion
//! before sleeping again, so no two cycles for the same coordinator ever
//! overlap. The whole-cycle timeout is the only cancellation surface — on
//! expiry the in-flight cycle is abandoned and a connection-class failure
//! recorded, while previously published data stays untouched.

use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use cartable_core::UpdateCoordinator;
use cartable_domain::{PollSettings, PortalError};
use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::error::{SchedulerError, SchedulerResult};

/// Type alias for the task handle to keep signatures readable
type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Configuration for the poll scheduler
#[derive(Debug, Clone)]
pub struct PollSchedulerConfig {
    /// Time between cycle starts
    pub interval: Duration,
    /// Upper bound on one whole cycle
    pub cycle_timeout: Duration,
}

impl PollSchedulerConfig {
    pub fn from_settings(settings: &PollSettings) -> Self {
        Self { interval: settings.interval(), cycle_timeout: settings.cycle_timeout() }
    }
}

impl Default for PollSchedulerConfig {
    fn default() -> Self {
        Self::from_settings(&PollSettings::default())
    }
}

/// Runs poll cycles on a fixed interval with graceful shutdown.
pub struct PollScheduler {
    coordinator: Arc<UpdateCoordinator>,
    config: PollSchedulerConfig,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
    last_failure: Arc<StdMutex<Option<PortalError>>>,
}

impl PollScheduler {
    pub fn new(coordinator: Arc<UpdateCoordinator>, config: PollSchedulerConfig) -> Self {
        Self {
            coordinator,
            config,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
            last_failure: Arc::new(StdMutex::new(None)),
        }
    }

    /// Start the background loop.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::AlreadyRunning`] when a loop is active.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        info!(interval = ?self.config.interval, "starting poll scheduler");

        // Fresh token so the scheduler can be restarted after a stop.
        self.cancellation_token = CancellationToken::new();

        let coordinator = Arc::clone(&self.coordinator);
        let config = self.config.clone();
        let cancel = self.cancellation_token.clone();
        let last_failure = Arc::clone(&self.last_failure);

        let handle = tokio::spawn(async move {
            Self::poll_loop(coordinator, config, cancel, last_failure).await;
        });
        *self.task_handle.lock().await = Some(handle);

        Ok(())
    }

    /// Stop the background loop gracefully.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::NotRunning`] when no loop is active.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        info!("stopping poll scheduler");
        self.cancellation_token.cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            let join_timeout = Duration::from_secs(5);
            match tokio::time::timeout(join_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(join_err)) => {
                    return Err(SchedulerError::JoinFailed(join_err.to_string()));
                }
                Err(_) => return Err(SchedulerError::ShutdownTimeout { timeout: join_timeout }),
            }
        }

        info!("poll scheduler stopped");
        Ok(())
    }

    /// Whether the background loop is active.
    pub fn is_running(&self) -> bool {
        self.task_handle
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|handle| !handle.is_finished()))
            .unwrap_or(false)
    }

    /// The failure reported by the most recent cycle, if it failed.
    ///
    /// Hosts surface this as a transient-update-failure, or persist a
    /// repair entry when `SessionExpired`/`RateLimited` repeats across
    /// consecutive cycles.
    pub fn last_failure(&self) -> Option<PortalError> {
        self.last_failure.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    async fn poll_loop(
        coordinator: Arc<UpdateCoordinator>,
        config: PollSchedulerConfig,
        cancel: CancellationToken,
        last_failure: Arc<StdMutex<Option<PortalError>>>,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("poll loop cancelled");
                    break;
                }
                _ = tokio::time::sleep(config.interval) => {
                    Self::run_once(&coordinator, &config, &last_failure).await;
                }
            }
        }
    }

    async fn run_once(
        coordinator: &Arc<UpdateCoordinator>,
        config: &PollSchedulerConfig,
        last_failure: &Arc<StdMutex<Option<PortalError>>>,
    ) {
        let today = Utc::now().date_naive();
        let failure = match tokio::time::timeout(config.cycle_timeout, coordinator.run_cycle(today))
            .await
        {
            Ok(outcome) => {
                if let Some(failure) = &outcome.failure {
                    warn!(error = %failure, "poll cycle failed");
                } else {
                    debug!(events = outcome.events_emitted, "poll cycle succeeded");
                }
                outcome.failure
            }
            Err(_) => {
                warn!(timeout = ?config.cycle_timeout, "poll cycle timed out, abandoning");
                Some(PortalError::Connection(format!(
                    "cycle timed out after {}s",
                    config.cycle_timeout.as_secs()
                )))
            }
        };

        *last_failure.lock().unwrap_or_else(PoisonError::into_inner) = failure;
    }
}
