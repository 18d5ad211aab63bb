//! Task record model.
//!
//! Defines the [`Task`] type persisted in the task store, its
//! [`Category`] and [`Priority`] enumerations, and the local timestamp
//! helpers used for `due_time`.
//!
//! `due_time` is kept as the string it was stored with. A record whose
//! timestamp cannot be parsed still loads, lists and exports with its raw
//! value; only due-evaluation skips it.

use crate::scheduler::recurrence::Recurrence;
use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize};

/// Accepted `due_time` layouts, tried in order after the default ISO parser.
const FALLBACK_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Task category assigned by the input parser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    #[default]
    Work,
    Study,
    Personal,
}

impl Category {
    /// Wire/display name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Work => "Work",
            Self::Study => "Study",
            Self::Personal => "Personal",
        }
    }

    /// Parse a stored name. Unknown names map to `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "work" => Some(Self::Work),
            "study" => Some(Self::Study),
            "personal" => Some(Self::Personal),
            _ => None,
        }
    }
}

impl From<String> for Category {
    fn from(raw: String) -> Self {
        Self::parse(&raw).unwrap_or_default()
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.as_str().to_owned()
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority assigned by the input parser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Wire/display name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// Parse a stored name. Unknown names map to `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl From<String> for Priority {
    fn from(raw: String) -> Self {
        Self::parse(&raw).unwrap_or_default()
    }
}

impl From<Priority> for String {
    fn from(value: Priority) -> Self {
        value.as_str().to_owned()
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single reminder task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier (UUID v4), immutable.
    pub id: String,
    /// User-facing description, immutable.
    pub description: String,
    /// Local ISO-8601 due timestamp, stored verbatim. Non-string values load
    /// as their JSON text and are skipped by the scan.
    #[serde(default, deserialize_with = "due_time_text")]
    pub due_time: String,
    /// Category fixed at creation.
    pub category: Category,
    /// Priority fixed at creation.
    pub priority: Priority,
    /// Recurrence fixed at creation.
    #[serde(default)]
    pub recurrence: Recurrence,
    /// Completion flag. Terminal for non-recurring tasks.
    #[serde(default)]
    pub completed: bool,
}

impl Task {
    /// Create a new pending task with a fresh id.
    pub fn new(
        description: impl Into<String>,
        due: NaiveDateTime,
        category: Category,
        priority: Priority,
        recurrence: Recurrence,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            description: description.into(),
            due_time: format_due_time(due),
            category,
            priority,
            recurrence,
            completed: false,
        }
    }

    /// Parsed due time, or `None` if the stored value is malformed.
    #[must_use]
    pub fn due_at(&self) -> Option<NaiveDateTime> {
        parse_due_time(&self.due_time)
    }

    /// Returns `true` for a task whose recurrence reschedules it after firing.
    #[must_use]
    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_recurring()
    }

    /// Time-of-day portion of the due time for compact display (`HH:MM:SS`).
    ///
    /// Falls back to the raw stored value when it does not parse.
    #[must_use]
    pub fn due_clock(&self) -> String {
        match self.due_at() {
            Some(due) => due.format("%H:%M:%S").to_string(),
            None => self.due_time.clone(),
        }
    }
}

fn due_time_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(raw) => raw,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Current local wall-clock time.
#[must_use]
pub fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Parse a stored `due_time` value.
#[must_use]
pub fn parse_due_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(parsed) = raw.parse::<NaiveDateTime>() {
        return Some(parsed);
    }
    FALLBACK_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Format a due time the way it is stored: seconds precision, with a
/// six-digit fraction only when sub-second microseconds are present.
#[must_use]
pub fn format_due_time(due: NaiveDateTime) -> String {
    if due.nanosecond() / 1_000 == 0 {
        due.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        due.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}
