//! Portal record types.
//!
//! Marks and averages stay string-typed: the portal reports localized
//! decimal strings ("14,5", "Absent") that must round-trip unmodified.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Stable upstream identifier of a single record.
///
/// Identifiers are opaque and unique within a category; change detection is
/// keyed on them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Common surface over the four notifiable record categories, used by the
/// change detector and event emitter.
pub trait PortalRecord {
    fn record_id(&self) -> &RecordId;

    /// Short human label carried in the emitted event (subject, evaluation
    /// name, or reason).
    fn label(&self) -> &str;

    /// The day the record refers to.
    fn event_date(&self) -> NaiveDate;
}

/// One grade entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub id: RecordId,
    pub date: NaiveDate,
    pub subject: String,
    pub value: String,
    pub out_of: String,
    #[serde(default)]
    pub coefficient: Option<String>,
    #[serde(default)]
    pub class_average: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl PortalRecord for Grade {
    fn record_id(&self) -> &RecordId {
        &self.id
    }

    fn label(&self) -> &str {
        &self.subject
    }

    fn event_date(&self) -> NaiveDate {
        self.date
    }
}

/// A skill acquisition level attached to an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acquisition {
    pub name: String,
    pub level: String,
}

/// One skills evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub acquisitions: Vec<Acquisition>,
}

impl PortalRecord for Evaluation {
    fn record_id(&self) -> &RecordId {
        &self.id
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn event_date(&self) -> NaiveDate {
        self.date
    }
}

/// One absence entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Absence {
    pub id: RecordId,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    #[serde(default)]
    pub justified: bool,
    #[serde(default)]
    pub hours: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl PortalRecord for Absence {
    fn record_id(&self) -> &RecordId {
        &self.id
    }

    fn label(&self) -> &str {
        self.reason.as_deref().unwrap_or("absence")
    }

    fn event_date(&self) -> NaiveDate {
        self.from.date_naive()
    }
}

/// One lateness entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delay {
    pub id: RecordId,
    pub date: DateTime<Utc>,
    pub minutes: u32,
    #[serde(default)]
    pub justified: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

impl PortalRecord for Delay {
    fn record_id(&self) -> &RecordId {
        &self.id
    }

    fn label(&self) -> &str {
        self.reason.as_deref().unwrap_or("delay")
    }

    fn event_date(&self) -> NaiveDate {
        self.date.date_naive()
    }
}

/// Canteen menu for one day. Feeds the host's menu renderer; rendering
/// itself happens host-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuDay {
    pub date: NaiveDate,
    #[serde(default)]
    pub lunch: Vec<String>,
    #[serde(default)]
    pub dinner: Vec<String>,
}

/// One timetable slot. Feeds the host's calendar renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: RecordId,
    #[serde(default)]
    pub subject: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub teacher: Option<String>,
    #[serde(default)]
    pub canceled: bool,
    #[serde(default)]
    pub status: Option<String>,
}
