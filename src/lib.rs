//! tasknudge: personal task and reminder manager.
//!
//! Tasks carry a due time and an optional recurrence. A background scheduler
//! scans the shared task book on a fixed cadence, fires every task whose due
//! time has passed, moves recurring tasks to their next occurrence and hands
//! the fired alerts to whichever front-end is in charge of presentation.
//!
//! # Architecture
//!
//! - **Scheduler**: task model, recurrence policy, due-scan engine and the
//!   tokio loop that drives it
//! - **Book**: the single shared accessor around tasks and their JSON store
//! - **Intake**: free-text parsing and add-request validation
//! - **Front-ends**: the stdio host bridge, the axum dashboard and the CLI,
//!   all routed through [`TaskServices`]

pub mod book;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod host;
pub mod intake;
pub mod logging;
pub mod nudge_dirs;
pub mod scheduler;
pub mod services;
pub mod store;

pub use book::TaskBook;
pub use config::NudgeConfig;
pub use error::{NudgeError, Result};
pub use intake::{AddRequest, KeywordParser, TaskParser};
pub use scheduler::{DueAlert, Recurrence, Scheduler, SchedulerEvent, Task};
pub use services::TaskServices;
pub use store::TaskStore;
