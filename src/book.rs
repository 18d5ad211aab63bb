//! Shared task book.
//!
//! [`TaskBook`] is the only way to reach the task collection. It pairs the
//! in-memory tasks with their [`TaskStore`] behind one mutex, so a scan and
//! its rescheduling, and any foreground mutation, each happen as a single
//! critical section followed by a save.

use crate::error::Result;
use crate::export;
use crate::intake::NewTask;
use crate::scheduler::scan::{ScanReport, scan};
use crate::scheduler::tasks::Task;
use crate::store::TaskStore;
use chrono::NaiveDateTime;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

#[derive(Debug)]
struct BookInner {
    tasks: Vec<Task>,
    store: TaskStore,
}

/// Cloneable handle to the shared task collection.
#[derive(Debug, Clone)]
pub struct TaskBook {
    inner: Arc<Mutex<BookInner>>,
}

impl TaskBook {
    /// Open a book over `store`, loading whatever it holds.
    ///
    /// # Errors
    ///
    /// Returns the store error when an existing file cannot be read or parsed.
    pub fn open(store: TaskStore) -> Result<Self> {
        let tasks = store.load()?;
        info!(count = tasks.len(), "task book opened");
        Ok(Self::from_parts(tasks, store))
    }

    /// Book that never touches disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_parts(Vec::new(), TaskStore::in_memory())
    }

    fn from_parts(tasks: Vec<Task>, store: TaskStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(BookInner { tasks, store })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BookInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append a new task due at `now + delay` and persist.
    ///
    /// # Errors
    ///
    /// Returns an input error for an out-of-range delay, or the store error
    /// if the save fails. A task that could not be saved is not kept.
    pub fn add(&self, new_task: NewTask, now: NaiveDateTime) -> Result<Task> {
        let task = new_task.into_task(now)?;
        let mut inner = self.lock();
        inner.tasks.push(task.clone());
        if let Err(e) = inner.store.save(&inner.tasks) {
            inner.tasks.pop();
            warn!(error = %e, "task not added: store save failed");
            return Err(e);
        }
        info!(task_id = %task.id, due = %task.due_time, "task added");
        Ok(task)
    }

    /// Replace the whole collection with `new_tasks`, all due relative to
    /// `now`. On any failure the previous collection is kept.
    ///
    /// # Errors
    ///
    /// Returns an input error for an out-of-range delay, or the store error
    /// if the save fails.
    pub fn replace_all(&self, new_tasks: Vec<NewTask>, now: NaiveDateTime) -> Result<Vec<Task>> {
        let tasks = new_tasks
            .into_iter()
            .map(|t| t.into_task(now))
            .collect::<Result<Vec<_>>>()?;
        let mut inner = self.lock();
        inner.store.save(&tasks)?;
        let replaced = std::mem::replace(&mut inner.tasks, tasks.clone()).len();
        info!(replaced, added = tasks.len(), "task collection replaced");
        Ok(tasks)
    }

    /// Snapshot of every task in collection order.
    #[must_use]
    pub fn list(&self) -> Vec<Task> {
        self.lock().tasks.clone()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<Task> {
        self.lock().tasks.iter().find(|t| t.id == id).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().tasks.is_empty()
    }

    /// Remove exactly the tasks whose `completed` flag is set.
    ///
    /// # Errors
    ///
    /// Returns the store error if the save fails.
    pub fn delete_completed(&self) -> Result<usize> {
        let mut inner = self.lock();
        let before = inner.tasks.len();
        inner.tasks.retain(|t| !t.completed);
        let removed = before - inner.tasks.len();
        if removed > 0 {
            inner.store.save(&inner.tasks)?;
        }
        info!(removed, "deleted completed tasks");
        Ok(removed)
    }

    /// Remove every task.
    ///
    /// # Errors
    ///
    /// Returns the store error if the save fails.
    pub fn clear(&self) -> Result<usize> {
        let mut inner = self.lock();
        let removed = inner.tasks.len();
        inner.tasks.clear();
        inner.store.save(&inner.tasks)?;
        info!(removed, "cleared all tasks");
        Ok(removed)
    }

    /// Run one due scan at `now` and persist if anything fired.
    ///
    /// The in-memory mutation stands even when the save fails; the error is
    /// returned so the caller can decide how loudly to complain.
    ///
    /// # Errors
    ///
    /// Returns the store error if the save fails.
    pub fn scan_due(&self, now: NaiveDateTime) -> Result<ScanReport> {
        let (report, saved) = self.scan_and_persist(now);
        saved.map(|()| report)
    }

    /// Like [`scan_due`](Self::scan_due) but keeps the report when the save
    /// fails, so fired alerts are never lost.
    pub fn scan_and_persist(&self, now: NaiveDateTime) -> (ScanReport, Result<()>) {
        let mut inner = self.lock();
        let report = scan(&mut inner.tasks, now);
        let saved = if report.changed() {
            inner.store.save(&inner.tasks)
        } else {
            Ok(())
        };
        debug!(
            fired = report.fired.len(),
            skipped = report.skipped.len(),
            "due scan complete"
        );
        (report, saved)
    }

    /// CSV rendering of the current collection.
    #[must_use]
    pub fn render_csv(&self) -> String {
        export::render_csv(&self.lock().tasks)
    }

    /// Write the current collection as CSV to `path`. Returns the row count.
    ///
    /// # Errors
    ///
    /// Returns [`crate::NudgeError::Export`] if the file cannot be written.
    pub fn export_csv(&self, path: &Path) -> Result<usize> {
        let tasks = self.list();
        let rows = export::write_csv(path, &tasks)?;
        info!(rows, "exported tasks to {}", path.display());
        Ok(rows)
    }
}
