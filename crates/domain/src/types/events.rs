//! Change sets and the events derived from them.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::period::PeriodId;
use super::records::RecordId;

/// Category of a newly observed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    NewGrade,
    NewEvaluation,
    NewAbsence,
    NewDelay,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::NewGrade => f.write_str("new_grade"),
            ChangeKind::NewEvaluation => f.write_str("new_evaluation"),
            ChangeKind::NewAbsence => f.write_str("new_absence"),
            ChangeKind::NewDelay => f.write_str("new_delay"),
        }
    }
}

/// Additions observed between two snapshots of the same period, keyed by
/// stable upstream identifier. Removals are not tracked: the upstream record
/// set is append-mostly and only additions are notifiable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub period_id: PeriodId,
    pub added_grades: Vec<RecordId>,
    pub added_evaluations: Vec<RecordId>,
    pub added_absences: Vec<RecordId>,
    pub added_delays: Vec<RecordId>,
}

impl ChangeSet {
    pub fn empty(period_id: PeriodId) -> Self {
        Self {
            period_id,
            added_grades: Vec::new(),
            added_evaluations: Vec::new(),
            added_absences: Vec::new(),
            added_delays: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.added_grades.len()
            + self.added_evaluations.len()
            + self.added_absences.len()
            + self.added_delays.len()
    }
}

/// One notification event, raised once per newly observed identifier.
///
/// The host routes these to its own notification/automation mechanism.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub period_id: PeriodId,
    pub record_id: RecordId,
    /// Subject, evaluation name, or reason — whatever best summarizes the
    /// record for a notification line.
    pub label: String,
    pub date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_kind_uses_wire_names() {
        assert_eq!(ChangeKind::NewGrade.to_string(), "new_grade");
        assert_eq!(ChangeKind::NewEvaluation.to_string(), "new_evaluation");
        assert_eq!(ChangeKind::NewAbsence.to_string(), "new_absence");
        assert_eq!(ChangeKind::NewDelay.to_string(), "new_delay");
    }

    #[test]
    fn empty_change_set_counts_zero() {
        let changes = ChangeSet::empty(PeriodId::from("t1"));
        assert!(changes.is_empty());
        assert_eq!(changes.len(), 0);
    }
}
