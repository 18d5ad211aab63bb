//! Error types for tasknudge.

/// Top-level error type for the task and reminder system.
#[derive(Debug, thiserror::Error)]
pub enum NudgeError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Task store error (read, parse, write).
    #[error("store error: {0}")]
    Store(String),

    /// Scheduler error (lifecycle, runtime).
    #[error("scheduler error: {0}")]
    Scheduler(String),

    /// Rejected user input at the interaction boundary.
    #[error("input error: {0}")]
    Input(String),

    /// CSV export error.
    #[error("export error: {0}")]
    Export(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send/receive error.
    #[error("channel error: {0}")]
    Channel(String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, NudgeError>;
