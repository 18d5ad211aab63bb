//! Recurrence policy.
//!
//! Maps a fired occurrence's due time to the next one using fixed
//! durations: a day is always 24 hours and a month is always 30 days.
//! Timestamps are naive local times, so DST and leap years never change
//! the offset.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// How a task repeats after it fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Recurrence {
    /// Fires once; completion is terminal.
    #[default]
    None,
    /// Every 24 hours.
    Daily,
    /// Every 7 × 24 hours.
    Weekly,
    /// Every 30 × 24 hours.
    Monthly,
}

impl Recurrence {
    /// All kinds, in menu order.
    pub const ALL: [Recurrence; 4] = [Self::None, Self::Daily, Self::Weekly, Self::Monthly];

    /// Wire/display name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Daily => "Daily",
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
        }
    }

    /// Lenient parse: anything unrecognized is [`Recurrence::None`].
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "daily" => Self::Daily,
            "weekly" => Self::Weekly,
            "monthly" => Self::Monthly,
            _ => Self::None,
        }
    }

    /// Fixed offset between occurrences, `None` for one-shot tasks.
    #[must_use]
    pub fn interval(self) -> Option<Duration> {
        match self {
            Self::None => None,
            Self::Daily => Some(Duration::hours(24)),
            Self::Weekly => Some(Duration::hours(7 * 24)),
            Self::Monthly => Some(Duration::hours(30 * 24)),
        }
    }

    /// Returns `true` when the task reschedules after firing.
    #[must_use]
    pub fn is_recurring(self) -> bool {
        self != Self::None
    }
}

impl From<String> for Recurrence {
    fn from(raw: String) -> Self {
        Self::parse_lenient(&raw)
    }
}

impl From<Recurrence> for String {
    fn from(value: Recurrence) -> Self {
        value.as_str().to_owned()
    }
}

impl std::fmt::Display for Recurrence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Next due time after `previous_due` for the given recurrence.
///
/// Returns `None` for [`Recurrence::None`] and when the addition would
/// overflow the representable calendar.
#[must_use]
pub fn next_due(previous_due: NaiveDateTime, recurrence: Recurrence) -> Option<NaiveDateTime> {
    let step = recurrence.interval()?;
    previous_due.checked_add_signed(step)
}
