//! Per-period and aggregated snapshots produced by a poll cycle.

use std::collections::HashMap;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::period::{Period, PeriodId};
use super::records::{Absence, Delay, Evaluation, Grade, Lesson, MenuDay};

/// Inclusive date range for menu and timetable fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Range starting at `start` and spanning `days` days forward.
    pub fn days_from(start: NaiveDate, days: u32) -> Self {
        let end = start.checked_add_days(Days::new(u64::from(days))).unwrap_or(start);
        Self { start, end }
    }
}

/// Result set for one period, in upstream order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSnapshot {
    pub period: Period,
    pub grades: Vec<Grade>,
    pub evaluations: Vec<Evaluation>,
    pub absences: Vec<Absence>,
    pub delays: Vec<Delay>,
    pub fetched_at: DateTime<Utc>,
}

impl PeriodSnapshot {
    pub fn record_count(&self) -> usize {
        self.grades.len() + self.evaluations.len() + self.absences.len() + self.delays.len()
    }
}

/// Aggregated output of one successful (or partially successful) cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub periods: Vec<Period>,
    pub current_period_id: Option<PeriodId>,
    pub data: HashMap<PeriodId, PeriodSnapshot>,
    pub menus: Vec<MenuDay>,
    pub timetable: Vec<Lesson>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.periods.is_empty()
    }

    /// The current period's result set, when present.
    pub fn current(&self) -> Option<&PeriodSnapshot> {
        self.current_period_id.as_ref().and_then(|id| self.data.get(id))
    }
}
