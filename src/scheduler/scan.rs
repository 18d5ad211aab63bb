//! Due-scan engine.
//!
//! One pass over the task collection at a given `now`: every pending task
//! whose due time has passed fires exactly once, is marked completed, and
//! (when recurring) is immediately moved to its next occurrence and reset
//! to pending. There is no catch-up loop; a task that is several
//! occurrences behind advances by one occurrence per scan.

use crate::scheduler::recurrence::next_due;
use crate::scheduler::tasks::{Task, format_due_time};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A task that crossed its due time during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueAlert {
    /// Snapshot of the task at the fired occurrence (`completed = true`,
    /// `due_time` = the occurrence that fired).
    pub task: Task,
    /// Rescheduled due time for recurring tasks.
    pub next_due_time: Option<String>,
}

impl DueAlert {
    /// Id of the fired task.
    #[must_use]
    pub fn task_id(&self) -> &str {
        &self.task.id
    }

    /// Short user-facing alert text.
    #[must_use]
    pub fn message(&self) -> String {
        format!("Task Due: {}", self.task.description)
    }
}

/// Outcome of one scan cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Alerts in collection order.
    pub fired: Vec<DueAlert>,
    /// Ids of pending tasks whose `due_time` could not be parsed.
    pub skipped: Vec<String>,
}

impl ScanReport {
    /// Returns `true` when the scan mutated the collection.
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.fired.is_empty()
    }
}

/// Scan `tasks` at `now`, mutating due tasks in place.
pub fn scan(tasks: &mut [Task], now: NaiveDateTime) -> ScanReport {
    let mut report = ScanReport::default();

    for task in tasks.iter_mut() {
        if task.completed {
            continue;
        }

        let Some(due) = task.due_at() else {
            warn!(
                task_id = %task.id,
                due_time = %task.due_time,
                "skipping task with malformed due time"
            );
            report.skipped.push(task.id.clone());
            continue;
        };

        if now < due {
            continue;
        }

        task.completed = true;
        let snapshot = task.clone();

        let mut next_due_time = None;
        if task.is_recurring() {
            match next_due(due, task.recurrence) {
                Some(next) => {
                    task.due_time = format_due_time(next);
                    task.completed = false;
                    next_due_time = Some(task.due_time.clone());
                }
                None => warn!(
                    task_id = %task.id,
                    recurrence = %task.recurrence,
                    "cannot compute next occurrence; leaving task completed"
                ),
            }
        }

        debug!(
            task_id = %task.id,
            recurrence = %task.recurrence,
            next_due = ?next_due_time,
            "task fired"
        );
        report.fired.push(DueAlert {
            task: snapshot,
            next_due_time,
        });
    }

    report
}
