//! JSON task store.
//!
//! The whole collection is read at startup and rewritten after every
//! mutation. Writes go to a sibling temp file that is renamed over the
//! target, so a crash mid-write never leaves a truncated store behind.

use crate::error::{NudgeError, Result};
use crate::scheduler::tasks::Task;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File-backed task store. A store without a path keeps nothing on disk.
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    path: Option<PathBuf>,
}

impl TaskStore {
    /// Store backed by the JSON file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Store that never touches disk: loads empty, saves nothing.
    #[must_use]
    pub fn in_memory() -> Self {
        Self { path: None }
    }

    /// Backing file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Load all tasks. A missing file is an empty collection.
    ///
    /// Records that are not task objects are logged and left out; the rest
    /// of the collection still loads.
    ///
    /// # Errors
    ///
    /// Returns [`NudgeError::Store`] when the file exists but cannot be read
    /// or is not a JSON array.
    pub fn load(&self) -> Result<Vec<Task>> {
        let Some(path) = &self.path else {
            return Ok(Vec::new());
        };

        let bytes = match std::fs::read(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no task store at {}, starting empty", path.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(NudgeError::Store(format!(
                    "cannot read {}: {e}",
                    path.display()
                )));
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let records: Vec<serde_json::Value> = serde_json::from_slice(&bytes)
            .map_err(|e| NudgeError::Store(format!("cannot parse {}: {e}", path.display())))?;

        let mut tasks = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            match serde_json::from_value::<Task>(record) {
                Ok(task) => tasks.push(task),
                Err(e) => warn!(index, "skipping unreadable task record: {e}"),
            }
        }
        Ok(tasks)
    }

    /// Overwrite the store with `tasks`.
    ///
    /// # Errors
    ///
    /// Returns [`NudgeError::Store`] when the directory, temp file or rename fails.
    pub fn save(&self, tasks: &[Task]) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| NudgeError::Store(format!("cannot create store dir: {e}")))?;
        }

        let json = serde_json::to_string_pretty(tasks)
            .map_err(|e| NudgeError::Store(format!("cannot serialize tasks: {e}")))?;

        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json)
            .map_err(|e| NudgeError::Store(format!("cannot write {}: {e}", tmp_path.display())))?;
        std::fs::rename(&tmp_path, path)
            .map_err(|e| NudgeError::Store(format!("cannot replace {}: {e}", path.display())))?;

        debug!(count = tasks.len(), "saved task store to {}", path.display());
        Ok(())
    }
}
