//! Authenticated session handle and credentials.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque session token issued by the portal adapter.
///
/// The token's contents are meaningful only to the concrete portal client;
/// this layer never inspects it. `Debug` is redacted so tokens cannot leak
/// through logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

/// An authenticated portal session.
///
/// Owned exclusively by the session manager; mutated only on login/re-login
/// and on use (`touch`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub token: SessionToken,
    pub established_at: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
}

impl Session {
    pub fn new(token: SessionToken) -> Self {
        let now = Utc::now();
        Self { id: Uuid::new_v4(), token, established_at: now, last_used: now }
    }

    /// Record a use of the session.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_used = now;
    }
}

/// Login credentials for the portal.
///
/// `Debug` redacts the password.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub url: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub device_identifier: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"***")
            .field("device_identifier", &self.device_identifier)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_never_contains_secrets() {
        let creds = Credentials {
            url: "https://portal.example".into(),
            username: "jdupont".into(),
            password: "hunter2".into(),
            device_identifier: None,
        };
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("hunter2"));

        let token = SessionToken::new("secret-token");
        assert!(!format!("{token:?}").contains("secret-token"));
    }

    #[test]
    fn touch_updates_last_used_only() {
        let mut session = Session::new(SessionToken::new("t"));
        let established = session.established_at;
        let later = established + chrono::Duration::minutes(5);

        session.touch(later);
        assert_eq!(session.last_used, later);
        assert_eq!(session.established_at, established);
    }
}
