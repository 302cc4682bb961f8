//! Per-period snapshot cache.
//!
//! Non-current periods are immutable upstream, so their snapshots are
//! fetched once and served from memory for the rest of the process
//! lifetime — the dominant latency win over a naive full refresh. The
//! current period is refetched on every call and its cached copy replaced
//! atomically.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use cartable_domain::{Period, PeriodId, PeriodSnapshot, Result};
use chrono::Utc;
use tracing::{debug, info};

use crate::ports::PortalGateway;

/// Cache of period result sets, keyed by period identifier.
///
/// Invariants: at most one entry per period id; non-current entries are
/// write-once (only `reconcile` removes them).
pub struct PeriodCache {
    gateway: Arc<dyn PortalGateway>,
    entries: Mutex<HashMap<PeriodId, PeriodSnapshot>>,
}

impl PeriodCache {
    pub fn new(gateway: Arc<dyn PortalGateway>) -> Self {
        Self { gateway, entries: Mutex::new(HashMap::new()) }
    }

    /// Return the period's snapshot, fetching through the gateway only when
    /// needed: always for the current period, once for non-current ones.
    pub async fn get_or_fetch(&self, period: &Period) -> Result<PeriodSnapshot> {
        if !period.is_current {
            if let Some(cached) = self.lock().get(&period.id).cloned() {
                debug!(period = %period.id, "serving period from cache");
                return Ok(cached);
            }
        }

        debug!(period = %period.id, current = period.is_current, "fetching period data");
        let grades = self.gateway.grades(period).await?;
        let evaluations = self.gateway.evaluations(period).await?;
        let absences = self.gateway.absences(period).await?;
        let delays = self.gateway.delays(period).await?;

        let snapshot = PeriodSnapshot {
            period: period.clone(),
            grades,
            evaluations,
            absences,
            delays,
            fetched_at: Utc::now(),
        };

        self.lock().insert(period.id.clone(), snapshot.clone());
        Ok(snapshot)
    }

    /// Reconcile the key set against the latest period list.
    ///
    /// Entries for periods the upstream no longer reports are pruned (new
    /// school year), and an entry whose recorded `is_current` flag disagrees
    /// with the list is evicted so the next fetch re-keys it (term
    /// boundary: yesterday's current period became final after the cached
    /// copy was taken).
    pub fn reconcile(&self, periods: &[Period]) {
        let mut entries = self.lock();
        entries.retain(|id, cached| {
            match periods.iter().find(|p| &p.id == id) {
                None => {
                    info!(period = %id, "pruning period no longer reported by the upstream");
                    false
                }
                Some(listed) if listed.is_current != cached.period.is_current => {
                    info!(period = %id, "evicting period whose current flag changed");
                    false
                }
                Some(_) => true,
            }
        });
    }

    pub fn contains(&self, id: &PeriodId) -> bool {
        self.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PeriodId, PeriodSnapshot>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
