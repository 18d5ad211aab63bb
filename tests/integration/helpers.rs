//! Shared helpers for integration tests.

use chrono::{NaiveDate, NaiveDateTime};
use std::path::PathBuf;
use tasknudge::scheduler::runner::{Scheduler, SchedulerEvent};
use tasknudge::{NudgeConfig, TaskBook, TaskServices, TaskStore};
use tokio::sync::mpsc;

/// Fixed reference instant used by the deterministic scenarios.
pub(crate) fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 11, 3)
        .expect("valid date")
        .and_hms_opt(9, 0, 0)
        .expect("valid time")
}

/// Path of `tasks.json` inside a fresh temp dir. Keep the dir alive.
pub(crate) fn temp_store_path() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("tasks.json");
    (dir, path)
}

/// Open a book over a temp store. Returns `(book, store_path, tempdir)`.
pub(crate) fn temp_book() -> (TaskBook, PathBuf, tempfile::TempDir) {
    let (dir, path) = temp_store_path();
    let book = TaskBook::open(TaskStore::new(&path)).expect("open book");
    (book, path, dir)
}

/// Services wired to a temp store and export path, with a fast scheduler.
/// Returns `(services, due_rx, tempdir)`.
pub(crate) fn temp_services() -> (
    TaskServices,
    mpsc::UnboundedReceiver<SchedulerEvent>,
    tempfile::TempDir,
) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let book = TaskBook::open(TaskStore::new(dir.path().join("tasks.json"))).expect("open book");
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let scheduler =
        Scheduler::new(book, event_tx).with_tick_interval(std::time::Duration::from_millis(10));
    let services = TaskServices::new(scheduler).with_export_path(dir.path().join("tasks.csv"));
    (services, event_rx, dir)
}

/// Default config pointing every path into `dir`.
pub(crate) fn config_in(dir: &std::path::Path) -> NudgeConfig {
    let mut config = NudgeConfig::default();
    config.store.path = Some(dir.join("tasks.json"));
    config.export.path = Some(dir.join("tasks.csv"));
    config
}

/// Wait for the next scheduler event, failing after five seconds.
pub(crate) async fn next_due(rx: &mut mpsc::UnboundedReceiver<SchedulerEvent>) -> SchedulerEvent {
    tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
        .await
        .expect("scheduler event within timeout")
        .expect("scheduler channel open")
}
