//! School periods (terms/semesters) as reported by the portal.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Stable upstream identifier of a period.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodId(String);

impl PeriodId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeriodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeriodId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// One grading period.
///
/// A period whose boundary has passed is immutable upstream; only the
/// current period accumulates new records. The current period's identity
/// changes at a term boundary, which the cache detects via `is_current`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Period {
    pub id: PeriodId,
    pub name: String,
    /// Chronological position within the school year, starting at 1.
    pub ordinal: u8,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub is_current: bool,
}

impl Period {
    /// Whether `day` falls within the period boundaries (inclusive).
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}
