//! Update coordinator: orchestration of one poll cycle.
//!
//! A cycle fetches the period list, reconciles the cache, walks the tracked
//! periods through the cache, diffs each against the previous cycle, emits
//! events for additions, and merges everything into the published snapshot.
//! Failures are scoped to the cycle: prior known-good data is never
//! cleared, and the first terminal failure is reported alongside whatever
//! the cycle could still assemble.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use cartable_domain::{
    DateRange, Period, PeriodId, PeriodSnapshot, PortalError, Snapshot, TrackingSettings,
};
use chrono::{NaiveDate, Utc};
use tracing::{debug, info, instrument, warn};

use crate::cache::PeriodCache;
use crate::diff::{diff, events_from};
use crate::ports::{EventSink, PortalGateway};

/// Result of one cycle: the merged snapshot (always present, falling back
/// to last known-good data) plus the first terminal failure, if any.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub snapshot: Snapshot,
    pub failure: Option<PortalError>,
    pub events_emitted: usize,
}

impl CycleOutcome {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Orchestrates the fetch-cache-diff-emit pipeline.
///
/// Owned as a single instance with an explicit lifecycle: construct once,
/// run cycles from the host's scheduler (never concurrently), drop.
pub struct UpdateCoordinator {
    gateway: Arc<dyn PortalGateway>,
    events: Arc<dyn EventSink>,
    cache: PeriodCache,
    tracking: TrackingSettings,
    /// Last cycle's snapshot per period, the diff baseline.
    previous: Mutex<HashMap<PeriodId, PeriodSnapshot>>,
    /// Last published aggregate, served while a cycle fails.
    published: Mutex<Option<Snapshot>>,
}

impl UpdateCoordinator {
    pub fn new(
        gateway: Arc<dyn PortalGateway>,
        events: Arc<dyn EventSink>,
        tracking: TrackingSettings,
    ) -> Self {
        let cache = PeriodCache::new(Arc::clone(&gateway));
        Self {
            gateway,
            events,
            cache,
            tracking,
            previous: Mutex::new(HashMap::new()),
            published: Mutex::new(None),
        }
    }

    /// The most recently published snapshot, if any cycle has completed.
    pub fn last_snapshot(&self) -> Option<Snapshot> {
        self.published.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Run one poll cycle.
    ///
    /// `today` anchors the menu/timetable horizons.
    #[instrument(skip(self))]
    pub async fn run_cycle(&self, today: NaiveDate) -> CycleOutcome {
        let mut failure: Option<PortalError> = None;
        let mut events_emitted = 0usize;

        let periods = match self.gateway.periods().await {
            Ok(periods) => periods,
            Err(error) => {
                warn!(error = %error, "period list fetch failed, serving last known data");
                return CycleOutcome {
                    snapshot: self.last_snapshot().unwrap_or_default(),
                    failure: Some(error),
                    events_emitted: 0,
                };
            }
        };

        self.cache.reconcile(&periods);
        self.previous
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|id, _| periods.iter().any(|p| &p.id == id));

        let current_period_id = periods.iter().find(|p| p.is_current).map(|p| p.id.clone());
        let mut data: HashMap<PeriodId, PeriodSnapshot> = HashMap::new();

        for period in self.tracked_periods(&periods) {
            match self.cache.get_or_fetch(&period).await {
                Ok(snapshot) => {
                    let changes = {
                        let previous = self.previous.lock().unwrap_or_else(PoisonError::into_inner);
                        diff(previous.get(&period.id), &snapshot)
                    };
                    if !changes.is_empty() {
                        debug!(period = %period.id, additions = changes.len(), "changes detected");
                    }
                    for event in events_from(&changes, &snapshot) {
                        self.events.emit(event);
                        events_emitted += 1;
                    }

                    self.previous
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .insert(period.id.clone(), snapshot.clone());
                    data.insert(period.id.clone(), snapshot);
                }
                Err(error) => {
                    warn!(period = %period.id, error = %error, "period fetch failed, keeping last known data");
                    let previous = self.previous.lock().unwrap_or_else(PoisonError::into_inner);
                    if let Some(kept) = previous.get(&period.id) {
                        data.insert(period.id.clone(), kept.clone());
                    }
                    drop(previous);
                    failure.get_or_insert(error);
                }
            }
        }

        let last = self.last_snapshot();

        let menus = match self.gateway.menus(DateRange::days_from(today, self.tracking.menu_days)).await
        {
            Ok(menus) => menus,
            Err(error) => {
                warn!(error = %error, "menu fetch failed, keeping last known menus");
                failure.get_or_insert(error);
                last.as_ref().map(|s| s.menus.clone()).unwrap_or_default()
            }
        };

        let timetable = match self
            .gateway
            .timetable(DateRange::days_from(today, self.tracking.timetable_days))
            .await
        {
            Ok(timetable) => timetable,
            Err(error) => {
                warn!(error = %error, "timetable fetch failed, keeping last known timetable");
                failure.get_or_insert(error);
                last.as_ref().map(|s| s.timetable.clone()).unwrap_or_default()
            }
        };

        for snapshot in data.values_mut() {
            self.apply_display_limits(snapshot);
        }

        let snapshot = Snapshot {
            periods,
            current_period_id,
            data,
            menus,
            timetable,
            updated_at: Some(Utc::now()),
        };

        *self.published.lock().unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());

        info!(
            events = events_emitted,
            failed = failure.is_some(),
            periods = snapshot.data.len(),
            "cycle complete"
        );
        CycleOutcome { snapshot, failure, events_emitted }
    }

    /// The current period plus preceding ones, newest first, bounded by
    /// `max_tracked_periods`. Future periods carry no records yet and are
    /// skipped.
    fn tracked_periods(&self, periods: &[Period]) -> Vec<Period> {
        let current_ordinal = periods.iter().find(|p| p.is_current).map(|p| p.ordinal);
        let mut tracked: Vec<Period> = periods
            .iter()
            .filter(|p| current_ordinal.map_or(true, |current| p.ordinal <= current))
            .cloned()
            .collect();
        tracked.sort_by(|a, b| b.ordinal.cmp(&a.ordinal));
        tracked.truncate(self.tracking.max_tracked_periods);
        tracked
    }

    /// Bound the published record sets to the configured display limits,
    /// keeping the most recent entries. Diffing always runs on the full
    /// sets, so truncation never suppresses or duplicates events.
    fn apply_display_limits(&self, snapshot: &mut PeriodSnapshot) {
        if snapshot.grades.len() > self.tracking.grades_display_limit {
            snapshot.grades.sort_by(|a, b| b.date.cmp(&a.date));
            snapshot.grades.truncate(self.tracking.grades_display_limit);
        }
        if snapshot.evaluations.len() > self.tracking.evaluations_display_limit {
            snapshot.evaluations.sort_by(|a, b| b.date.cmp(&a.date));
            snapshot.evaluations.truncate(self.tracking.evaluations_display_limit);
        }
    }
}
