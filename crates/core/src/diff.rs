//! Change detection between successive snapshots of one period.
//!
//! Additions are keyed on stable upstream identifiers: a record present in
//! both snapshots is never re-notified, even if its content changed.
//! Removals are not observable events — the upstream record set is
//! append-mostly.

use std::collections::HashSet;

use cartable_domain::{
    ChangeEvent, ChangeKind, ChangeSet, PeriodId, PeriodSnapshot, PortalRecord, RecordId,
};

/// Diff two snapshots of the same period.
///
/// With no previous snapshot (first successful fetch for the period) the
/// change set is empty: there is no baseline to compare against, and
/// treating every initial record as new would cause a notification storm.
pub fn diff(previous: Option<&PeriodSnapshot>, current: &PeriodSnapshot) -> ChangeSet {
    let Some(previous) = previous else {
        return ChangeSet::empty(current.period.id.clone());
    };

    ChangeSet {
        period_id: current.period.id.clone(),
        added_grades: added_ids(&previous.grades, &current.grades),
        added_evaluations: added_ids(&previous.evaluations, &current.evaluations),
        added_absences: added_ids(&previous.absences, &current.absences),
        added_delays: added_ids(&previous.delays, &current.delays),
    }
}

/// Expand a change set into events, one per newly observed identifier.
///
/// Events are ordered grades, absences, delays, evaluations; within a
/// category they follow upstream record order.
pub fn events_from(changes: &ChangeSet, current: &PeriodSnapshot) -> Vec<ChangeEvent> {
    let mut events = Vec::with_capacity(changes.len());
    collect(&mut events, ChangeKind::NewGrade, &changes.period_id, &changes.added_grades, &current.grades);
    collect(&mut events, ChangeKind::NewAbsence, &changes.period_id, &changes.added_absences, &current.absences);
    collect(&mut events, ChangeKind::NewDelay, &changes.period_id, &changes.added_delays, &current.delays);
    collect(
        &mut events,
        ChangeKind::NewEvaluation,
        &changes.period_id,
        &changes.added_evaluations,
        &current.evaluations,
    );
    events
}

fn added_ids<R: PortalRecord>(previous: &[R], current: &[R]) -> Vec<RecordId> {
    let seen: HashSet<&RecordId> = previous.iter().map(PortalRecord::record_id).collect();
    current
        .iter()
        .map(PortalRecord::record_id)
        .filter(|id| !seen.contains(id))
        .cloned()
        .collect()
}

fn collect<R: PortalRecord>(
    out: &mut Vec<ChangeEvent>,
    kind: ChangeKind,
    period_id: &PeriodId,
    added: &[RecordId],
    records: &[R],
) {
    for record in records {
        if added.contains(record.record_id()) {
            out.push(ChangeEvent {
                kind,
                period_id: period_id.clone(),
                record_id: record.record_id().clone(),
                label: record.label().to_owned(),
                date: record.event_date(),
            });
        }
    }
}
