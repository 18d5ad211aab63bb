//! Front-end facing task operations.
//!
//! [`TaskServices`] bundles the task book, the scheduler and the intake
//! settings so the host bridge, the dashboard and the CLI all run the same
//! operations with the same validation.

use crate::book::TaskBook;
use crate::config::NudgeConfig;
use crate::error::Result;
use crate::intake::{self, AddRequest, DEFAULT_DELAY_MINUTES, KeywordParser, TaskParser};
use crate::scheduler::runner::{
    Scheduler, SchedulerEvent, SchedulerState, StartOutcome, StopOutcome,
};
use crate::scheduler::scan::ScanReport;
use crate::scheduler::tasks::{Task, now_local};
use crate::store::TaskStore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Scheduler status snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStatus {
    pub state: SchedulerState,
    pub tick_interval_ms: u64,
    pub task_count: usize,
    pub pending_count: usize,
}

/// Shared handle to every task operation a front-end can request.
#[derive(Clone)]
pub struct TaskServices {
    book: TaskBook,
    scheduler: Scheduler,
    parser: Arc<dyn TaskParser>,
    default_delay_minutes: f64,
    export_path: PathBuf,
}

impl std::fmt::Debug for TaskServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskServices")
            .field("scheduler", &self.scheduler)
            .field("default_delay_minutes", &self.default_delay_minutes)
            .field("export_path", &self.export_path)
            .finish_non_exhaustive()
    }
}

impl TaskServices {
    /// Services over an existing scheduler and its book.
    #[must_use]
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            book: scheduler.book().clone(),
            scheduler,
            parser: Arc::new(KeywordParser),
            default_delay_minutes: DEFAULT_DELAY_MINUTES,
            export_path: crate::nudge_dirs::export_file(),
        }
    }

    /// Open the configured store and wire a stopped scheduler to it.
    ///
    /// Returns the services plus the receiving end of the scheduler's event
    /// channel, which the caller's foreground loop must drain.
    ///
    /// # Errors
    ///
    /// Returns the store error when the task file cannot be loaded.
    pub fn from_config(
        config: &NudgeConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SchedulerEvent>)> {
        let book = TaskBook::open(TaskStore::new(config.store.resolved_path()))?;
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let scheduler =
            Scheduler::new(book, event_tx).with_tick_interval(config.scheduler.tick_interval());
        let services = Self::new(scheduler)
            .with_default_delay(config.intake.default_delay_minutes)
            .with_export_path(config.export.resolved_path());
        Ok((services, event_rx))
    }

    /// Replace the input parser strategy.
    #[must_use]
    pub fn with_parser(mut self, parser: impl TaskParser + 'static) -> Self {
        self.parser = Arc::new(parser);
        self
    }

    #[must_use]
    pub fn with_default_delay(mut self, minutes: f64) -> Self {
        self.default_delay_minutes = minutes;
        self
    }

    #[must_use]
    pub fn with_export_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.export_path = path.into();
        self
    }

    #[must_use]
    pub fn book(&self) -> &TaskBook {
        &self.book
    }

    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    #[must_use]
    pub fn export_path(&self) -> &Path {
        &self.export_path
    }

    /// Validate, parse and store one add request.
    ///
    /// # Errors
    ///
    /// Returns [`crate::NudgeError::Input`] for an empty description, or the
    /// store error if the save fails.
    pub fn add(&self, request: &AddRequest) -> Result<Task> {
        let new_task = intake::prepare(self.parser.as_ref(), request, self.default_delay_minutes)?;
        self.book.add(new_task, now_local())
    }

    /// Add the canned demo tasks.
    ///
    /// # Errors
    ///
    /// Returns the first add failure; tasks added before it stay.
    pub fn add_demo(&self) -> Result<Vec<Task>> {
        intake::demo_requests()
            .iter()
            .map(|request| self.add(request))
            .collect()
    }

    /// Replace every task with the quick demo set used by the dashboard.
    ///
    /// # Errors
    ///
    /// Returns the store error if the save fails; the old tasks then stay.
    pub fn run_demo(&self) -> Result<Vec<Task>> {
        let new_tasks = intake::quick_demo_requests()
            .iter()
            .map(|request| {
                intake::prepare(self.parser.as_ref(), request, self.default_delay_minutes)
            })
            .collect::<Result<Vec<_>>>()?;
        self.book.replace_all(new_tasks, now_local())
    }

    #[must_use]
    pub fn list(&self) -> Vec<Task> {
        self.book.list()
    }

    /// # Errors
    ///
    /// Returns the store error if the save fails.
    pub fn delete_completed(&self) -> Result<usize> {
        self.book.delete_completed()
    }

    /// # Errors
    ///
    /// Returns the store error if the save fails.
    pub fn clear(&self) -> Result<usize> {
        self.book.clear()
    }

    /// Export to `path`, or to the configured export path.
    ///
    /// # Errors
    ///
    /// Returns [`crate::NudgeError::Export`] if the file cannot be written.
    pub fn export(&self, path: Option<&Path>) -> Result<(usize, PathBuf)> {
        let target = path.map_or_else(|| self.export_path.clone(), Path::to_path_buf);
        let rows = self.book.export_csv(&target)?;
        Ok((rows, target))
    }

    /// Run one due scan right now.
    #[must_use]
    pub fn check_now(&self) -> ScanReport {
        self.scheduler.run_once(now_local())
    }

    /// # Errors
    ///
    /// Returns [`crate::NudgeError::Scheduler`] outside a tokio runtime.
    pub fn start_scheduler(&self) -> Result<StartOutcome> {
        self.scheduler.start()
    }

    pub fn stop_scheduler(&self) -> StopOutcome {
        self.scheduler.stop()
    }

    #[must_use]
    pub fn status(&self) -> SchedulerStatus {
        let tasks = self.book.list();
        SchedulerStatus {
            state: self.scheduler.state(),
            tick_interval_ms: u64::try_from(self.scheduler.tick_interval().as_millis())
                .unwrap_or(u64::MAX),
            task_count: tasks.len(),
            pending_count: tasks.iter().filter(|t| !t.completed).count(),
        }
    }
}
