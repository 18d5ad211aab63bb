//! Versioned host command/event envelopes.

use serde::{Deserialize, Serialize};

/// Contract version for host command/event envelopes.
pub const EVENT_VERSION: u32 = 1;

/// Command set understood by the host bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandName {
    #[serde(rename = "host.ping")]
    HostPing,
    #[serde(rename = "host.version")]
    HostVersion,
    #[serde(rename = "host.shutdown")]
    HostShutdown,
    #[serde(rename = "tasks.list")]
    TasksList,
    #[serde(rename = "tasks.add")]
    TasksAdd,
    #[serde(rename = "tasks.add_demo")]
    TasksAddDemo,
    #[serde(rename = "tasks.delete_completed")]
    TasksDeleteCompleted,
    #[serde(rename = "tasks.clear")]
    TasksClear,
    #[serde(rename = "tasks.export")]
    TasksExport,
    #[serde(rename = "scheduler.start")]
    SchedulerStart,
    #[serde(rename = "scheduler.stop")]
    SchedulerStop,
    #[serde(rename = "scheduler.status")]
    SchedulerStatus,
    #[serde(rename = "scheduler.check_now")]
    SchedulerCheckNow,
}

impl CommandName {
    /// Every command, in documentation order.
    pub const ALL: [CommandName; 13] = [
        Self::HostPing,
        Self::HostVersion,
        Self::HostShutdown,
        Self::TasksList,
        Self::TasksAdd,
        Self::TasksAddDemo,
        Self::TasksDeleteCompleted,
        Self::TasksClear,
        Self::TasksExport,
        Self::SchedulerStart,
        Self::SchedulerStop,
        Self::SchedulerStatus,
        Self::SchedulerCheckNow,
    ];

    /// Render command name to wire format.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HostPing => "host.ping",
            Self::HostVersion => "host.version",
            Self::HostShutdown => "host.shutdown",
            Self::TasksList => "tasks.list",
            Self::TasksAdd => "tasks.add",
            Self::TasksAddDemo => "tasks.add_demo",
            Self::TasksDeleteCompleted => "tasks.delete_completed",
            Self::TasksClear => "tasks.clear",
            Self::TasksExport => "tasks.export",
            Self::SchedulerStart => "scheduler.start",
            Self::SchedulerStop => "scheduler.stop",
            Self::SchedulerStatus => "scheduler.status",
            Self::SchedulerCheckNow => "scheduler.check_now",
        }
    }

    /// Parse a command name from wire format.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == raw)
    }
}

/// Event names emitted by the host.
pub mod events {
    pub const TASK_ADDED: &str = "task.added";
    pub const TASK_DUE: &str = "task.due";
    pub const TASKS_DELETED: &str = "tasks.deleted";
    pub const SCHEDULER_STARTED: &str = "scheduler.started";
    pub const SCHEDULER_STOPPED: &str = "scheduler.stopped";
}

/// A versioned response envelope from backend host -> frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub v: u32,
    pub request_id: String,
    pub ok: bool,
    pub payload: serde_json::Value,
    pub error: Option<String>,
}

impl ResponseEnvelope {
    /// Build a successful response envelope.
    #[must_use]
    pub fn ok(request_id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            v: EVENT_VERSION,
            request_id: request_id.into(),
            ok: true,
            payload,
            error: None,
        }
    }

    /// Build an error response envelope.
    #[must_use]
    pub fn error(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            v: EVENT_VERSION,
            request_id: request_id.into(),
            ok: false,
            payload: serde_json::Value::Null,
            error: Some(message.into()),
        }
    }
}

/// A versioned command envelope from frontend -> backend host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub v: u32,
    pub request_id: String,
    pub command: CommandName,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl CommandEnvelope {
    /// Build a v1 command envelope.
    #[must_use]
    pub fn new(
        request_id: impl Into<String>,
        command: CommandName,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            v: EVENT_VERSION,
            request_id: request_id.into(),
            command,
            payload,
        }
    }

    /// Validate envelope version and required identifiers.
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.v != EVENT_VERSION {
            return Err(ContractError::new(
                ContractErrorKind::UnsupportedVersion,
                format!(
                    "unsupported contract version {}; expected {}",
                    self.v, EVENT_VERSION
                ),
            ));
        }
        if self.request_id.trim().is_empty() {
            return Err(ContractError::new(
                ContractErrorKind::InvalidEnvelope,
                "request_id cannot be empty".to_owned(),
            ));
        }
        Ok(())
    }
}

/// A versioned event envelope from backend host -> frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub v: u32,
    pub event_id: String,
    pub event: String,
    pub payload: serde_json::Value,
}

impl EventEnvelope {
    /// Build a v1 event envelope.
    #[must_use]
    pub fn new(
        event_id: impl Into<String>,
        event: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            v: EVENT_VERSION,
            event_id: event_id.into(),
            event: event.into(),
            payload,
        }
    }
}

/// Contract validation error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractErrorKind {
    UnsupportedVersion,
    InvalidEnvelope,
}

/// Contract validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractError {
    pub kind: ContractErrorKind,
    pub message: String,
}

impl ContractError {
    #[must_use]
    pub fn new(kind: ContractErrorKind, message: String) -> Self {
        Self { kind, message }
    }
}

impl std::fmt::Display for ContractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ContractError {}
