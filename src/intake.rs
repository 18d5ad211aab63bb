//! Task intake: free-text parsing and add-request validation.
//!
//! The parser is a replaceable strategy behind [`TaskParser`]; the default
//! [`KeywordParser`] applies a fixed set of keyword and regex rules. Input
//! validation happens here, at the interaction boundary, before anything
//! reaches the task book.

use crate::error::{NudgeError, Result};
use crate::scheduler::recurrence::Recurrence;
use crate::scheduler::tasks::{Category, Priority, Task};
use chrono::{Duration, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

/// Reminder delay used when none (or an unusable one) is given.
pub const DEFAULT_DELAY_MINUTES: f64 = 10.0;

static MINUTES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*minute").expect("valid minutes regex")
});
static HOURS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*hour").expect("valid hours regex"));

/// Structured fields inferred from free text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTask {
    pub description: String,
    /// Requested delay from now, in minutes.
    pub minutes: f64,
    pub category: Category,
    pub priority: Priority,
    pub recurrence: Recurrence,
}

/// Free text → structured task fields.
pub trait TaskParser: Send + Sync {
    fn parse(&self, text: &str) -> ParsedTask;
}

/// Keyword/regex heuristics.
///
/// - `N minute(s)` sets the delay; `N hour(s)` overrides it with `N × 60`;
///   `tomorrow` overrides both with one day.
/// - `urgent` / `important` → [`Priority::High`].
/// - `study` → [`Category::Study`], else `personal` → [`Category::Personal`].
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordParser;

impl TaskParser for KeywordParser {
    fn parse(&self, text: &str) -> ParsedTask {
        let lower = text.to_lowercase();
        let mut minutes = DEFAULT_DELAY_MINUTES;

        if let Some(value) = capture_number(&MINUTES_RE, text) {
            minutes = value;
        }
        if let Some(value) = capture_number(&HOURS_RE, text) {
            minutes = value * 60.0;
        }
        if lower.contains("tomorrow") {
            minutes = 24.0 * 60.0;
        }

        let priority = if lower.contains("urgent") || lower.contains("important") {
            Priority::High
        } else {
            Priority::Medium
        };

        let category = if lower.contains("study") {
            Category::Study
        } else if lower.contains("personal") {
            Category::Personal
        } else {
            Category::Work
        };

        ParsedTask {
            description: text.to_owned(),
            minutes,
            category,
            priority,
            recurrence: Recurrence::None,
        }
    }
}

fn capture_number(re: &Regex, text: &str) -> Option<f64> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Raw add request as it arrives from a front-end.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AddRequest {
    /// Free-text task description.
    pub text: String,
    /// Explicit reminder delay in minutes, as typed. `None` uses the parser's.
    #[serde(default)]
    pub minutes: Option<String>,
    /// Explicit recurrence name. `None` uses the parser's.
    #[serde(default)]
    pub recurrence: Option<String>,
}

impl AddRequest {
    /// Request with text only.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_minutes(mut self, minutes: impl Into<String>) -> Self {
        self.minutes = Some(minutes.into());
        self
    }

    #[must_use]
    pub fn with_recurrence(mut self, recurrence: impl Into<String>) -> Self {
        self.recurrence = Some(recurrence.into());
        self
    }

    /// Read a request from a JSON object `{text, minutes?, recurrence?}`.
    ///
    /// `minutes` may be a number or a string; anything else is kept as its
    /// JSON text and later falls back to the default delay.
    ///
    /// # Errors
    ///
    /// Returns [`NudgeError::Input`] when `text` is missing or not a string.
    pub fn from_json(payload: &serde_json::Value) -> Result<Self> {
        let Some(text) = payload.get("text").and_then(serde_json::Value::as_str) else {
            return Err(NudgeError::Input("payload.text is required".to_owned()));
        };

        let minutes = match payload.get("minutes") {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(raw)) => Some(raw.clone()),
            Some(other) => Some(other.to_string()),
        };

        let recurrence = payload
            .get("recurrence")
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned);

        Ok(Self {
            text: text.to_owned(),
            minutes,
            recurrence,
        })
    }
}

/// A validated task waiting for its creation timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub description: String,
    pub delay_minutes: f64,
    pub category: Category,
    pub priority: Priority,
    pub recurrence: Recurrence,
}

impl NewTask {
    /// Materialize the task with `due_time = now + delay`.
    ///
    /// # Errors
    ///
    /// Returns [`NudgeError::Input`] when the delay overflows the calendar.
    pub fn into_task(self, now: NaiveDateTime) -> Result<Task> {
        let millis = (self.delay_minutes * 60_000.0).round();
        let due = Duration::try_milliseconds(millis as i64)
            .filter(|_| millis.abs() < i64::MAX as f64)
            .and_then(|delay| now.checked_add_signed(delay))
            .ok_or_else(|| {
                NudgeError::Input(format!(
                    "reminder delay of {} minutes is out of range",
                    self.delay_minutes
                ))
            })?;

        Ok(Task::new(
            self.description,
            due,
            self.category,
            self.priority,
            self.recurrence,
        ))
    }
}

/// Validate an add request and merge it with the parser's inference.
///
/// An empty description blocks the add. An explicit delay that is not a
/// non-negative number falls back to `default_delay_minutes`.
///
/// # Errors
///
/// Returns [`NudgeError::Input`] when the description is empty.
pub fn prepare(
    parser: &dyn TaskParser,
    request: &AddRequest,
    default_delay_minutes: f64,
) -> Result<NewTask> {
    let text = request.text.trim();
    if text.is_empty() {
        return Err(NudgeError::Input("please enter a task".to_owned()));
    }

    let parsed = parser.parse(text);

    let delay_minutes = match request.minutes.as_deref() {
        Some(raw) => parse_delay(raw).unwrap_or_else(|| {
            warn!(
                requested = raw,
                fallback = default_delay_minutes,
                "invalid reminder delay; using default"
            );
            default_delay_minutes
        }),
        None => parsed.minutes,
    };

    let recurrence = request
        .recurrence
        .as_deref()
        .map(Recurrence::parse_lenient)
        .unwrap_or(parsed.recurrence);

    Ok(NewTask {
        description: parsed.description,
        delay_minutes,
        category: parsed.category,
        priority: parsed.priority,
        recurrence,
    })
}

fn parse_delay(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// Canned requests for the "add demo tasks" action.
#[must_use]
pub fn demo_requests() -> Vec<AddRequest> {
    vec![
        AddRequest::text("Demo: Submit Capstone in 1 minute").with_minutes("1"),
        AddRequest::text("Demo: Call friend in 2 minute").with_minutes("2"),
    ]
}

/// Requests for the dashboard's "run demo" action: three tasks due within
/// seconds, with delays taken from the text.
#[must_use]
pub fn quick_demo_requests() -> Vec<AddRequest> {
    vec![
        AddRequest::text("Submit Kaggle Capstone in 0.1 minute"),
        AddRequest::text("Call friend in 0.2 minute"),
        AddRequest::text("Complete Python notebook in 0.3 minute"),
    ]
}
