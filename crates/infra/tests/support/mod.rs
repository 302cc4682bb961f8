//! Scripted portal client double shared by the infra integration suites.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cartable_core::ports::PortalClient;
use cartable_domain::{
    Absence, CartableConfig, Credentials, DateRange, Delay, Evaluation, Grade, Lesson, MenuDay,
    Period, PeriodId, PortalError, RecordId, Result, Session, SessionToken,
};
use chrono::NaiveDate;

/// In-memory portal client with scriptable failures and call counters.
#[derive(Default)]
pub struct MockPortalClient {
    script: Mutex<ClientScript>,
    pub login_calls: AtomicUsize,
    pub alive_calls: AtomicUsize,
    pub periods_calls: AtomicUsize,
    pub grades_calls: AtomicUsize,
    /// Sessions are reported alive unless this is cleared.
    alive: AtomicBool,
}

#[derive(Default)]
struct ClientScript {
    login_error: Option<PortalError>,
    periods: Vec<Period>,
    grades: HashMap<PeriodId, Result<Vec<Grade>>>,
    /// Number of fetch calls that reject the session before behaving
    /// normally again; models a mid-use expiry.
    expired_fetches_remaining: usize,
}

impl MockPortalClient {
    pub fn new() -> Arc<Self> {
        let client = Self::default();
        client.alive.store(true, Ordering::SeqCst);
        Arc::new(client)
    }

    pub fn set_periods(&self, periods: Vec<Period>) {
        self.script.lock().unwrap().periods = periods;
    }

    pub fn set_grades(&self, period: &PeriodId, grades: Vec<Grade>) {
        self.script.lock().unwrap().grades.insert(period.clone(), Ok(grades));
    }

    pub fn fail_grades(&self, period: &PeriodId, error: PortalError) {
        self.script.lock().unwrap().grades.insert(period.clone(), Err(error));
    }

    pub fn fail_login(&self, error: PortalError) {
        self.script.lock().unwrap().login_error = Some(error);
    }

    pub fn allow_login(&self) {
        self.script.lock().unwrap().login_error = None;
    }

    pub fn set_alive(&self, alive: bool) {
        self.alive.store(alive, Ordering::SeqCst);
    }

    /// The next `count` fetches reject their session as expired.
    pub fn expire_next_fetches(&self, count: usize) {
        self.script.lock().unwrap().expired_fetches_remaining = count;
    }

    fn check_session(&self) -> Result<()> {
        let mut script = self.script.lock().unwrap();
        if script.expired_fetches_remaining > 0 {
            script.expired_fetches_remaining -= 1;
            return Err(PortalError::SessionExpired("session rejected by upstream".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl PortalClient for MockPortalClient {
    async fn login(&self, _credentials: &Credentials) -> Result<Session> {
        let calls = self.login_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let script = self.script.lock().unwrap();
        match &script.login_error {
            Some(error) => Err(error.clone()),
            None => Ok(Session::new(SessionToken::new(format!("token-{calls}")))),
        }
    }

    async fn is_session_alive(&self, _session: &Session) -> bool {
        self.alive_calls.fetch_add(1, Ordering::SeqCst);
        self.alive.load(Ordering::SeqCst)
    }

    async fn list_periods(&self, _session: &Session) -> Result<Vec<Period>> {
        self.periods_calls.fetch_add(1, Ordering::SeqCst);
        self.check_session()?;
        Ok(self.script.lock().unwrap().periods.clone())
    }

    async fn fetch_grades(&self, _session: &Session, period: &Period) -> Result<Vec<Grade>> {
        self.grades_calls.fetch_add(1, Ordering::SeqCst);
        self.check_session()?;
        self.script.lock().unwrap().grades.get(&period.id).cloned().unwrap_or_else(|| Ok(vec![]))
    }

    async fn fetch_evaluations(
        &self,
        _session: &Session,
        _period: &Period,
    ) -> Result<Vec<Evaluation>> {
        self.check_session()?;
        Ok(vec![])
    }

    async fn fetch_absences(&self, _session: &Session, _period: &Period) -> Result<Vec<Absence>> {
        self.check_session()?;
        Ok(vec![])
    }

    async fn fetch_delays(&self, _session: &Session, _period: &Period) -> Result<Vec<Delay>> {
        self.check_session()?;
        Ok(vec![])
    }

    async fn fetch_menus(&self, _session: &Session, _range: DateRange) -> Result<Vec<MenuDay>> {
        self.check_session()?;
        Ok(vec![])
    }

    async fn fetch_timetable(&self, _session: &Session, _range: DateRange) -> Result<Vec<Lesson>> {
        self.check_session()?;
        Ok(vec![])
    }
}

// Fixtures

pub fn credentials() -> Credentials {
    Credentials {
        url: "https://portal.example/eleve.html".into(),
        username: "jdupont".into(),
        password: "secret".into(),
        device_identifier: None,
    }
}

/// Config tuned for tests: generous rate limit, single attempt, no jitter,
/// threshold 3, long cooldown, fresh sessions.
pub fn test_config() -> CartableConfig {
    let mut config = CartableConfig::default();
    config.rate_limit.max_requests = 1_000;
    config.rate_limit.max_wait_secs = 0;
    config.retry.max_attempts = 1;
    config.retry.base_delay_ms = 1;
    config.retry.max_delay_ms = 2;
    config.retry.jitter_ratio = 0.0;
    config.circuit_breaker.failure_threshold = 3;
    config.circuit_breaker.cooldown_secs = 300;
    config.session.freshness_secs = 3_600;
    config
}

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
        value: "15".into(),
        out_of: "20".into(),
        coefficient: None,
        class_average: None,
        comment: None,
    }
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 15).unwrap()
}
