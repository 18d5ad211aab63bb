//! CSV export of the task collection.

use crate::error::{NudgeError, Result};
use crate::scheduler::tasks::Task;
use std::path::Path;

/// Record terminator (CRLF).
pub const CSV_LINE_END: &str = "\r\n";

/// Column header, in row order.
pub const CSV_HEADER: [&str; 7] = [
    "ID",
    "Task",
    "Due Time",
    "Category",
    "Priority",
    "Recurrence",
    "Completed",
];

/// Render tasks as CSV text: header plus one row per task, in order.
///
/// `due_time` is written exactly as stored.
#[must_use]
pub fn render_csv(tasks: &[Task]) -> String {
    let mut out = String::new();
    out.push_str(&CSV_HEADER.join(","));
    out.push_str(CSV_LINE_END);

    for task in tasks {
        let fields = [
            csv_escape(&task.id),
            csv_escape(&task.description),
            csv_escape(&task.due_time),
            task.category.to_string(),
            task.priority.to_string(),
            task.recurrence.to_string(),
            bool_cell(task.completed).to_owned(),
        ];
        out.push_str(&fields.join(","));
        out.push_str(CSV_LINE_END);
    }

    out
}

/// Write the CSV rendering of `tasks` to `path`. Returns the row count.
///
/// # Errors
///
/// Returns [`NudgeError::Export`] if the file cannot be written.
pub fn write_csv(path: &Path, tasks: &[Task]) -> Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| NudgeError::Export(format!("cannot create export dir: {e}")))?;
    }

    let tmp_path = path.with_extension("csv.tmp");
    std::fs::write(&tmp_path, render_csv(tasks))
        .map_err(|e| NudgeError::Export(format!("cannot write {}: {e}", tmp_path.display())))?;
    std::fs::rename(&tmp_path, path)
        .map_err(|e| NudgeError::Export(format!("cannot replace {}: {e}", path.display())))?;

    Ok(tasks.len())
}

fn bool_cell(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_owned()
    }
}
