//! Scheduler background loop.
//!
//! Spawns a tokio task that scans the shared [`TaskBook`] for due tasks on a
//! fixed cadence. Fired alerts are handed to the foreground over an
//! unbounded channel; the loop itself never touches presentation state.

use crate::book::TaskBook;
use crate::error::{NudgeError, Result};
use crate::scheduler::scan::{DueAlert, ScanReport};
use crate::scheduler::tasks::now_local;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Default interval between scans.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(5);

/// Message from the scheduler to the foreground.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// Tasks that fired in one cycle, in scan order.
    Due(Vec<DueAlert>),
}

/// Lifecycle state of the background loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    Stopped,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    AlreadyStopped,
}

struct RunningLoop {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl RunningLoop {
    fn is_live(&self) -> bool {
        !self.cancel.is_cancelled() && !self.handle.is_finished()
    }
}

/// Background scheduler driving periodic due scans.
///
/// Cheap to clone; every clone controls the same loop.
#[derive(Clone)]
pub struct Scheduler {
    book: TaskBook,
    event_tx: mpsc::UnboundedSender<SchedulerEvent>,
    tick_interval: Duration,
    running: Arc<Mutex<Option<RunningLoop>>>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("tick_interval", &self.tick_interval)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    /// Create a stopped scheduler over `book` that reports through `event_tx`.
    pub fn new(book: TaskBook, event_tx: mpsc::UnboundedSender<SchedulerEvent>) -> Self {
        Self {
            book,
            event_tx,
            tick_interval: DEFAULT_TICK_INTERVAL,
            running: Arc::new(Mutex::new(None)),
        }
    }

    /// Override the scan cadence. Zero is clamped to one millisecond.
    #[must_use]
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval.max(Duration::from_millis(1));
        self
    }

    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// The book this scheduler scans.
    #[must_use]
    pub fn book(&self) -> &TaskBook {
        &self.book
    }

    fn slot(&self) -> MutexGuard<'_, Option<RunningLoop>> {
        self.running.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[must_use]
    pub fn state(&self) -> SchedulerState {
        match self.slot().as_ref() {
            Some(running) if running.is_live() => SchedulerState::Running,
            _ => SchedulerState::Stopped,
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state() == SchedulerState::Running
    }

    /// Start the background loop on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`NudgeError::Scheduler`] when called outside a tokio runtime.
    pub fn start(&self) -> Result<StartOutcome> {
        let mut slot = self.slot();
        if slot.as_ref().is_some_and(RunningLoop::is_live) {
            debug!("scheduler already running");
            return Ok(StartOutcome::AlreadyRunning);
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| NudgeError::Scheduler(format!("no async runtime to run on: {e}")))?;
        let cancel = CancellationToken::new();
        let handle = runtime.spawn(run_loop(
            self.book.clone(),
            self.event_tx.clone(),
            self.tick_interval,
            cancel.clone(),
        ));
        *slot = Some(RunningLoop { cancel, handle });

        info!(tick_ms = self.tick_interval.as_millis(), "scheduler started");
        Ok(StartOutcome::Started)
    }

    /// Signal the loop to stop. A scan in flight finishes; no further scan
    /// is scheduled.
    pub fn stop(&self) -> StopOutcome {
        let slot = self.slot();
        match slot.as_ref() {
            Some(running) if running.is_live() => {
                running.cancel.cancel();
                info!("scheduler stopping");
                StopOutcome::Stopped
            }
            _ => {
                debug!("scheduler already stopped");
                StopOutcome::AlreadyStopped
            }
        }
    }

    /// Stop and wait for the loop task to exit.
    pub async fn shutdown(&self) {
        let running = self.slot().take();
        if let Some(running) = running {
            running.cancel.cancel();
            if let Err(e) = running.handle.await {
                error!("scheduler loop ended abnormally: {e}");
            }
        }
    }

    /// Run a single scan cycle at `now` with the same persistence and event
    /// semantics as the background loop.
    pub fn run_once(&self, now: NaiveDateTime) -> ScanReport {
        let report = scan_cycle(&self.book, now);
        if report.changed() && !send_due(&self.event_tx, &report) {
            debug!("scheduler event receiver closed; on-demand alerts dropped");
        }
        report
    }
}

async fn run_loop(
    book: TaskBook,
    event_tx: mpsc::UnboundedSender<SchedulerEvent>,
    tick_interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(tick_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("scheduler stopped");
                break;
            }
            _ = ticker.tick() => {
                let cycle_book = book.clone();
                let report = match tokio::task::spawn_blocking(move || {
                    scan_cycle(&cycle_book, now_local())
                })
                .await
                {
                    Ok(report) => report,
                    Err(e) => {
                        error!("due scan task failed: {e}");
                        continue;
                    }
                };
                if report.changed() && !send_due(&event_tx, &report) {
                    debug!("scheduler event receiver closed; exiting loop");
                    break;
                }
            }
        }
    }
}

/// Scan and persist. Save failures are logged; the alerts still go out.
fn scan_cycle(book: &TaskBook, now: NaiveDateTime) -> ScanReport {
    let (report, saved) = book.scan_and_persist(now);
    if let Err(e) = saved {
        error!("failed to persist tasks after due scan: {e}");
    }
    report
}

fn send_due(event_tx: &mpsc::UnboundedSender<SchedulerEvent>, report: &ScanReport) -> bool {
    for alert in &report.fired {
        info!(task_id = %alert.task_id(), "{}", alert.message());
    }
    event_tx
        .send(SchedulerEvent::Due(report.fired.clone()))
        .is_ok()
}
