//! Session manager: reuse, liveness probing, and re-authentication.
//!
//! Session reuse is the key optimization of the whole client: a full login
//! round trip on every poll cycle is what this avoids. A session used
//! within the freshness window is handed out directly; a stale one is
//! probed with the cheap liveness call before falling back to a re-login.

use std::sync::Arc;

use cartable_domain::{Credentials, PortalError, Result, Session, SessionSettings};
use chrono::{Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use cartable_core::ports::PortalClient;

#[derive(Default)]
struct SessionState {
    session: Option<Session>,
    /// Whether a login ever succeeded. Distinguishes the failure of a
    /// re-authentication (`SessionExpired`) from a failed first login.
    previously_live: bool,
}

/// Owns the authenticated session on behalf of the resilient client.
///
/// The stored session is mutated only on login/re-login and on use; under
/// the coordinator's single-flight guarantee the mutex is never contended.
pub struct SessionManager {
    client: Arc<dyn PortalClient>,
    credentials: Credentials,
    freshness: Duration,
    state: Mutex<SessionState>,
}

impl SessionManager {
    pub fn new(
        client: Arc<dyn PortalClient>,
        credentials: Credentials,
        settings: &SessionSettings,
    ) -> Self {
        Self {
            client,
            credentials,
            freshness: Duration::seconds(settings.freshness_secs as i64),
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Return a live session, authenticating only when needed.
    ///
    /// A failed re-authentication of a previously-live session surfaces as
    /// `SessionExpired`; a failed initial login keeps its own
    /// classification (`Connection`/`Unknown` by cause).
    pub async fn ensure_session(&self) -> Result<Session> {
        let mut state = self.state.lock().await;

        if let Some(session) = state.session.as_mut() {
            let now = Utc::now();
            if now.signed_duration_since(session.last_used) <= self.freshness {
                session.touch(now);
                return Ok(session.clone());
            }
            if self.client.is_session_alive(session).await {
                debug!("stale session is still alive, reusing");
                session.touch(now);
                return Ok(session.clone());
            }
            info!("stored session is no longer alive, re-authenticating");
            state.session = None;
        }

        match self.client.login(&self.credentials).await {
            Ok(session) => {
                info!("portal login succeeded");
                state.session = Some(session.clone());
                state.previously_live = true;
                Ok(session)
            }
            Err(error) if state.previously_live => {
                warn!(error = %error, "re-authentication after session loss failed");
                Err(PortalError::SessionExpired(format!("re-authentication failed: {error}")))
            }
            Err(error) => {
                warn!(error = %error, "initial portal login failed");
                Err(error)
            }
        }
    }

    /// Drop the stored session after the upstream rejected it mid-use; the
    /// next `ensure_session` performs a fresh login.
    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        if state.session.take().is_some() {
            info!("session invalidated after upstream rejection");
        }
    }

    pub async fn has_session(&self) -> bool {
        self.state.lock().await.session.is_some()
    }
}
