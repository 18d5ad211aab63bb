//! Reminder scheduling.
//!
//! The task model, the recurrence policy, the due-scan engine and the
//! background driver that runs the scan on a cadence.

pub mod recurrence;
pub mod runner;
pub mod scan;
pub mod tasks;

pub use recurrence::{Recurrence, next_due};
pub use runner::{Scheduler, SchedulerEvent, SchedulerState, StartOutcome, StopOutcome};
pub use scan::{DueAlert, ScanReport, scan};
pub use tasks::{Category, Priority, Task};
