//! Port interfaces for the update pipeline.

use async_trait::async_trait;
use cartable_domain::{
    Absence, ChangeEvent, Credentials, DateRange, Delay, Evaluation, Grade, Lesson, MenuDay,
    Period, Result, Session,
};

/// Raw capability of a concrete portal client adapter.
///
/// This is the boundary to the upstream provider: wire protocol, parsing,
/// and authentication mechanics live behind it. Adapters classify their
/// failures into the `PortalError` taxonomy before returning. Operations are
/// session-explicit; session ownership stays with the session manager.
#[async_trait]
pub trait PortalClient: Send + Sync {
    /// Authenticate and return a fresh session.
    async fn login(&self, credentials: &Credentials) -> Result<Session>;

    /// Cheap liveness probe for an existing session.
    async fn is_session_alive(&self, session: &Session) -> bool;

    /// All periods of the school year, in chronological order.
    async fn list_periods(&self, session: &Session) -> Result<Vec<Period>>;

    async fn fetch_grades(&self, session: &Session, period: &Period) -> Result<Vec<Grade>>;

    async fn fetch_evaluations(&self, session: &Session, period: &Period)
        -> Result<Vec<Evaluation>>;

    async fn fetch_absences(&self, session: &Session, period: &Period) -> Result<Vec<Absence>>;

    async fn fetch_delays(&self, session: &Session, period: &Period) -> Result<Vec<Delay>>;

    async fn fetch_menus(&self, session: &Session, range: DateRange) -> Result<Vec<MenuDay>>;

    async fn fetch_timetable(&self, session: &Session, range: DateRange) -> Result<Vec<Lesson>>;
}

/// Session-free, resilience-wrapped view of the portal.
///
/// The single surface the coordinator and cache talk to. The one
/// implementation composes rate limiting, circuit breaking, session
/// management, and retries around a [`PortalClient`]; tests substitute an
/// in-memory double.
#[async_trait]
pub trait PortalGateway: Send + Sync {
    async fn periods(&self) -> Result<Vec<Period>>;

    async fn grades(&self, period: &Period) -> Result<Vec<Grade>>;

    async fn evaluations(&self, period: &Period) -> Result<Vec<Evaluation>>;

    async fn absences(&self, period: &Period) -> Result<Vec<Absence>>;

    async fn delays(&self, period: &Period) -> Result<Vec<Delay>>;

    async fn menus(&self, range: DateRange) -> Result<Vec<MenuDay>>;

    async fn timetable(&self, range: DateRange) -> Result<Vec<Lesson>>;
}

/// Receiver for change events, implemented by the host collaborator.
///
/// The host routes events to its own notification/automation mechanism;
/// emission must not block the cycle.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ChangeEvent);
}
