//! Shared test doubles for the core integration suites.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cartable_core::ports::{EventSink, PortalGateway};
use cartable_domain::{
    Absence, ChangeEvent, DateRange, Delay, Evaluation, Grade, Lesson, MenuDay, Period, PeriodId,
    PortalError, RecordId, Result,
};
use chrono::NaiveDate;

/// Scripted in-memory gateway.
///
/// Results are configured per period and can be swapped between cycles;
/// call counters let tests assert which operations actually hit the
/// "upstream".
#[derive(Default)]
pub struct MockGateway {
    script: Mutex<Script>,
    pub periods_calls: AtomicUsize,
    pub grades_calls: AtomicUsize,
    pub evaluations_calls: AtomicUsize,
    pub absences_calls: AtomicUsize,
    pub delays_calls: AtomicUsize,
    pub menus_calls: AtomicUsize,
    pub timetable_calls: AtomicUsize,
}

#[derive(Default)]
struct Script {
    periods: Option<Result<Vec<Period>>>,
    grades: HashMap<PeriodId, Result<Vec<Grade>>>,
    evaluations: HashMap<PeriodId, Result<Vec<Evaluation>>>,
    absences: HashMap<PeriodId, Result<Vec<Absence>>>,
    delays: HashMap<PeriodId, Result<Vec<Delay>>>,
    menus: Option<Result<Vec<MenuDay>>>,
    timetable: Option<Result<Vec<Lesson>>>,
}

impl MockGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_periods(&self, periods: Vec<Period>) {
        self.script.lock().unwrap().periods = Some(Ok(periods));
    }

    pub fn fail_periods(&self, error: PortalError) {
        self.script.lock().unwrap().periods = Some(Err(error));
    }

    pub fn set_grades(&self, period: &PeriodId, grades: Vec<Grade>) {
        self.script.lock().unwrap().grades.insert(period.clone(), Ok(grades));
    }

    pub fn fail_grades(&self, period: &PeriodId, error: PortalError) {
        self.script.lock().unwrap().grades.insert(period.clone(), Err(error));
    }

    pub fn set_absences(&self, period: &PeriodId, absences: Vec<Absence>) {
        self.script.lock().unwrap().absences.insert(period.clone(), Ok(absences));
    }

    pub fn set_delays(&self, period: &PeriodId, delays: Vec<Delay>) {
        self.script.lock().unwrap().delays.insert(period.clone(), Ok(delays));
    }

    pub fn set_evaluations(&self, period: &PeriodId, evaluations: Vec<Evaluation>) {
        self.script.lock().unwrap().evaluations.insert(period.clone(), Ok(evaluations));
    }

    pub fn set_menus(&self, menus: Vec<MenuDay>) {
        self.script.lock().unwrap().menus = Some(Ok(menus));
    }

    pub fn fail_menus(&self, error: PortalError) {
        self.script.lock().unwrap().menus = Some(Err(error));
    }
}

#[async_trait]
impl PortalGateway for MockGateway {
    async fn periods(&self) -> Result<Vec<Period>> {
        self.periods_calls.fetch_add(1, Ordering::SeqCst);
        self.script.lock().unwrap().periods.clone().unwrap_or_else(|| Ok(vec![]))
    }

    async fn grades(&self, period: &Period) -> Result<Vec<Grade>> {
        self.grades_calls.fetch_add(1, Ordering::SeqCst);
        self.script.lock().unwrap().grades.get(&period.id).cloned().unwrap_or_else(|| Ok(vec![]))
    }

    async fn evaluations(&self, period: &Period) -> Result<Vec<Evaluation>> {
        self.evaluations_calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .evaluations
            .get(&period.id)
            .cloned()
            .unwrap_or_else(|| Ok(vec![]))
    }

    async fn absences(&self, period: &Period) -> Result<Vec<Absence>> {
        self.absences_calls.fetch_add(1, Ordering::SeqCst);
        self.script.lock().unwrap().absences.get(&period.id).cloned().unwrap_or_else(|| Ok(vec![]))
    }

    async fn delays(&self, period: &Period) -> Result<Vec<Delay>> {
        self.delays_calls.fetch_add(1, Ordering::SeqCst);
        self.script.lock().unwrap().delays.get(&period.id).cloned().unwrap_or_else(|| Ok(vec![]))
    }

    async fn menus(&self, _range: DateRange) -> Result<Vec<MenuDay>> {
        self.menus_calls.fetch_add(1, Ordering::SeqCst);
        self.script.lock().unwrap().menus.clone().unwrap_or_else(|| Ok(vec![]))
    }

    async fn timetable(&self, _range: DateRange) -> Result<Vec<Lesson>> {
        self.timetable_calls.fetch_add(1, Ordering::SeqCst);
        self.script.lock().unwrap().timetable.clone().unwrap_or_else(|| Ok(vec![]))
    }
}

/// Event sink that records everything it receives.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ChangeEvent>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: ChangeEvent) {
        self.events.lock().unwrap().push(event);
    }
}

// Builders for fixture data

pub fn period(id: &str, ordinal: u8, is_current: bool) -> Period {
    Period {
        id: PeriodId::from(id),
        name: format!("Trimestre {ordinal}"),
        ordinal,
        start: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
        end: NaiveDate::from_ymd_opt(2026, 6, 30).unwrap(),
        is_current,
    }
}

pub fn grade(id: &str, subject: &str, day: u32) -> Grade {
    Grade {
        id: RecordId::from(id),
        date: NaiveDate::from_ymd_opt(2025, 10, day).unwrap(),
        subject: subject.into(),
        value: "14".into(),
        out_of: "20".into(),
        coefficient: Some("1".into()),
        class_average: None,
        comment: None,
    }
}

pub fn absence(id: &str, reason: &str) -> Absence {
    let from = chrono::DateTime::parse_from_rfc3339("2025-10-06T08:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    Absence {
        id: RecordId::from(id),
        from,
        to: from + chrono::Duration::hours(2),
        justified: false,
        hours: Some("2h".into()),
        reason: Some(reason.into()),
    }
}

pub fn delay(id: &str, minutes: u32) -> Delay {
    let date = chrono::DateTime::parse_from_rfc3339("2025-10-07T08:10:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    Delay { id: RecordId::from(id), date, minutes, justified: false, reason: None }
}

pub fn evaluation(id: &str, name: &str) -> Evaluation {
    Evaluation {
        id: RecordId::from(id),
        name: name.into(),
        subject: Some("Physique".into()),
        date: NaiveDate::from_ymd_opt(2025, 10, 9).unwrap(),
        acquisitions: vec![],
    }
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 15).unwrap()
}
