//! Host command channel and router.
//!
//! [`HostCommandServer`] is the foreground context for host integrations: it
//! answers commands from [`HostCommandClient`]s and, on the same loop, turns
//! scheduler alerts into `task.due` events.

use crate::error::{NudgeError, Result};
use crate::host::contract::{
    CommandEnvelope, CommandName, EVENT_VERSION, EventEnvelope, ResponseEnvelope, events,
};
use crate::intake::AddRequest;
use crate::scheduler::runner::{SchedulerEvent, StartOutcome, StopOutcome};
use crate::scheduler::scan::DueAlert;
use crate::services::TaskServices;
use std::path::PathBuf;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info};

struct HostCommandRequest {
    envelope: CommandEnvelope,
    response_tx: oneshot::Sender<Result<ResponseEnvelope>>,
}

#[derive(Clone)]
pub struct HostCommandClient {
    request_tx: mpsc::Sender<HostCommandRequest>,
    event_tx: broadcast::Sender<EventEnvelope>,
}

impl HostCommandClient {
    pub async fn send(&self, envelope: CommandEnvelope) -> Result<ResponseEnvelope> {
        envelope.validate().map_err(|e| {
            NudgeError::Input(format!(
                "invalid host command envelope {}: {}",
                envelope.request_id, e
            ))
        })?;

        let (response_tx, response_rx) = oneshot::channel();
        self.request_tx
            .send(HostCommandRequest {
                envelope,
                response_tx,
            })
            .await
            .map_err(|e| NudgeError::Channel(format!("failed to send host command request: {e}")))?;

        response_rx
            .await
            .map_err(|e| NudgeError::Channel(format!("host command response dropped: {e}")))?
    }

    #[must_use]
    pub fn subscribe_events(&self) -> broadcast::Receiver<EventEnvelope> {
        self.event_tx.subscribe()
    }
}

pub struct HostCommandServer {
    request_rx: mpsc::Receiver<HostCommandRequest>,
    event_tx: broadcast::Sender<EventEnvelope>,
    due_rx: mpsc::UnboundedReceiver<SchedulerEvent>,
    services: TaskServices,
}

/// Create a client/server pair over `services`.
///
/// `due_rx` is the receiving end of the scheduler's event channel; the
/// server drains it and republishes each alert as a `task.due` event.
#[must_use]
pub fn command_channel(
    request_capacity: usize,
    event_capacity: usize,
    services: TaskServices,
    due_rx: mpsc::UnboundedReceiver<SchedulerEvent>,
) -> (HostCommandClient, HostCommandServer) {
    let (event_tx, _event_rx) = broadcast::channel(event_capacity.max(1));
    let (request_tx, request_rx) = mpsc::channel(request_capacity.max(1));

    (
        HostCommandClient {
            request_tx,
            event_tx: event_tx.clone(),
        },
        HostCommandServer {
            request_rx,
            event_tx,
            due_rx,
            services,
        },
    )
}

impl HostCommandServer {
    /// Serve until every client is dropped, then stop the scheduler.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                request = self.request_rx.recv() => {
                    let Some(request) = request else {
                        debug!("all host command clients dropped");
                        break;
                    };
                    let response = self.route(&request.envelope);
                    let _ = request.response_tx.send(response);
                }
                Some(event) = self.due_rx.recv() => self.publish_scheduler_event(event),
            }
        }

        self.services.scheduler().shutdown().await;
        while let Ok(event) = self.due_rx.try_recv() {
            self.publish_scheduler_event(event);
        }
    }

    /// Route a command envelope to the appropriate handler.
    pub fn route(&self, envelope: &CommandEnvelope) -> Result<ResponseEnvelope> {
        match envelope.command {
            CommandName::HostPing => Ok(ResponseEnvelope::ok(
                envelope.request_id.clone(),
                serde_json::json!({"pong": true}),
            )),
            CommandName::HostVersion => Ok(ResponseEnvelope::ok(
                envelope.request_id.clone(),
                serde_json::json!({
                    "contract_version": EVENT_VERSION,
                    "version": env!("CARGO_PKG_VERSION"),
                    "channel": "host_command_v1"
                }),
            )),
            CommandName::HostShutdown => Ok(ResponseEnvelope::ok(
                envelope.request_id.clone(),
                serde_json::json!({"shutting_down": true}),
            )),
            CommandName::TasksList => self.handle_tasks_list(envelope),
            CommandName::TasksAdd => self.handle_tasks_add(envelope),
            CommandName::TasksAddDemo => self.handle_tasks_add_demo(envelope),
            CommandName::TasksDeleteCompleted => self.handle_tasks_delete_completed(envelope),
            CommandName::TasksClear => self.handle_tasks_clear(envelope),
            CommandName::TasksExport => self.handle_tasks_export(envelope),
            CommandName::SchedulerStart => self.handle_scheduler_start(envelope),
            CommandName::SchedulerStop => self.handle_scheduler_stop(envelope),
            CommandName::SchedulerStatus => self.handle_scheduler_status(envelope),
            CommandName::SchedulerCheckNow => self.handle_scheduler_check_now(envelope),
        }
    }

    fn handle_tasks_list(&self, envelope: &CommandEnvelope) -> Result<ResponseEnvelope> {
        let tasks = self.services.list();
        Ok(ResponseEnvelope::ok(
            envelope.request_id.clone(),
            serde_json::json!({"count": tasks.len(), "tasks": tasks}),
        ))
    }

    fn handle_tasks_add(&self, envelope: &CommandEnvelope) -> Result<ResponseEnvelope> {
        let request = AddRequest::from_json(&envelope.payload)?;
        let task = self.services.add(&request)?;

        self.emit_event(
            events::TASK_ADDED,
            serde_json::json!({"request_id": envelope.request_id, "task": task}),
        );

        Ok(ResponseEnvelope::ok(
            envelope.request_id.clone(),
            serde_json::json!({"task": task}),
        ))
    }

    fn handle_tasks_add_demo(&self, envelope: &CommandEnvelope) -> Result<ResponseEnvelope> {
        let tasks = self.services.add_demo()?;
        for task in &tasks {
            self.emit_event(
                events::TASK_ADDED,
                serde_json::json!({"request_id": envelope.request_id, "task": task}),
            );
        }

        Ok(ResponseEnvelope::ok(
            envelope.request_id.clone(),
            serde_json::json!({"count": tasks.len(), "tasks": tasks}),
        ))
    }

    fn handle_tasks_delete_completed(
        &self,
        envelope: &CommandEnvelope,
    ) -> Result<ResponseEnvelope> {
        let removed = self.services.delete_completed()?;
        self.emit_event(
            events::TASKS_DELETED,
            serde_json::json!({"scope": "completed", "removed": removed}),
        );
        Ok(ResponseEnvelope::ok(
            envelope.request_id.clone(),
            serde_json::json!({"removed": removed}),
        ))
    }

    fn handle_tasks_clear(&self, envelope: &CommandEnvelope) -> Result<ResponseEnvelope> {
        let removed = self.services.clear()?;
        self.emit_event(
            events::TASKS_DELETED,
            serde_json::json!({"scope": "all", "removed": removed}),
        );
        Ok(ResponseEnvelope::ok(
            envelope.request_id.clone(),
            serde_json::json!({"removed": removed}),
        ))
    }

    fn handle_tasks_export(&self, envelope: &CommandEnvelope) -> Result<ResponseEnvelope> {
        let path = parse_optional_path(&envelope.payload)?;
        let (rows, path) = self.services.export(path.as_deref())?;
        Ok(ResponseEnvelope::ok(
            envelope.request_id.clone(),
            serde_json::json!({"rows": rows, "path": path.display().to_string()}),
        ))
    }

    fn handle_scheduler_start(&self, envelope: &CommandEnvelope) -> Result<ResponseEnvelope> {
        let outcome = self.services.start_scheduler()?;
        let already_running = outcome == StartOutcome::AlreadyRunning;
        if !already_running {
            self.emit_event(
                events::SCHEDULER_STARTED,
                serde_json::json!({"request_id": envelope.request_id}),
            );
        }
        Ok(ResponseEnvelope::ok(
            envelope.request_id.clone(),
            serde_json::json!({"state": "running", "already_running": already_running}),
        ))
    }

    fn handle_scheduler_stop(&self, envelope: &CommandEnvelope) -> Result<ResponseEnvelope> {
        let already_stopped = self.services.stop_scheduler() == StopOutcome::AlreadyStopped;
        if !already_stopped {
            self.emit_event(
                events::SCHEDULER_STOPPED,
                serde_json::json!({"request_id": envelope.request_id}),
            );
        }
        Ok(ResponseEnvelope::ok(
            envelope.request_id.clone(),
            serde_json::json!({"state": "stopped", "already_stopped": already_stopped}),
        ))
    }

    fn handle_scheduler_status(&self, envelope: &CommandEnvelope) -> Result<ResponseEnvelope> {
        let status = serde_json::to_value(self.services.status())
            .map_err(|e| NudgeError::Scheduler(format!("cannot encode status: {e}")))?;
        Ok(ResponseEnvelope::ok(envelope.request_id.clone(), status))
    }

    fn handle_scheduler_check_now(&self, envelope: &CommandEnvelope) -> Result<ResponseEnvelope> {
        let report = self.services.check_now();
        let fired: Vec<&str> = report.fired.iter().map(DueAlert::task_id).collect();
        Ok(ResponseEnvelope::ok(
            envelope.request_id.clone(),
            serde_json::json!({"fired": fired, "skipped": report.skipped}),
        ))
    }

    fn publish_scheduler_event(&self, event: SchedulerEvent) {
        match event {
            SchedulerEvent::Due(alerts) => {
                info!(count = alerts.len(), "publishing due alerts");
                for alert in alerts {
                    self.emit_event(
                        events::TASK_DUE,
                        serde_json::json!({
                            "message": alert.message(),
                            "task": alert.task,
                            "next_due_time": alert.next_due_time,
                        }),
                    );
                }
            }
        }
    }

    fn emit_event(&self, event: &str, payload: serde_json::Value) {
        let envelope =
            EventEnvelope::new(uuid::Uuid::new_v4().to_string(), event.to_owned(), payload);
        let _ = self.event_tx.send(envelope);
    }
}

fn parse_optional_path(payload: &serde_json::Value) -> Result<Option<PathBuf>> {
    match payload.get("path") {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(raw)) if !raw.trim().is_empty() => {
            Ok(Some(PathBuf::from(raw)))
        }
        Some(_) => Err(NudgeError::Input(
            "tasks.export payload.path must be a non-empty string".to_owned(),
        )),
    }
}
