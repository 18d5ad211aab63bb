//! Browser dashboard.
//!
//! A small axum server exposing the task operations as JSON endpoints plus
//! a plain HTML task table at `/`. Scheduler alerts are drained by a
//! background task into a bounded list of recent alerts that the page and
//! `/api/reminders/recent` display.

use crate::config::DashboardConfig;
use crate::error::NudgeError;
use crate::intake::AddRequest;
use crate::scheduler::runner::{SchedulerEvent, SchedulerState, StartOutcome, StopOutcome};
use crate::scheduler::scan::DueAlert;
use crate::scheduler::tasks::Task;
use crate::services::TaskServices;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Bounded, newest-last list of alerts shown on the dashboard.
#[derive(Debug, Clone)]
pub struct RecentAlerts {
    inner: Arc<Mutex<VecDeque<DueAlert>>>,
    limit: usize,
}

impl RecentAlerts {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::new())),
            limit: limit.max(1),
        }
    }

    pub fn record(&self, alerts: impl IntoIterator<Item = DueAlert>) {
        let mut recent = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        for alert in alerts {
            recent.push_back(alert);
            while recent.len() > self.limit {
                recent.pop_front();
            }
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<DueAlert> {
        let recent = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        recent.iter().cloned().collect()
    }
}

#[derive(Clone)]
struct DashboardState {
    services: TaskServices,
    recent: RecentAlerts,
}

/// Forward scheduler alerts into `recent` until the channel closes.
pub fn spawn_alert_collector(
    mut due_rx: mpsc::UnboundedReceiver<SchedulerEvent>,
    recent: RecentAlerts,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = due_rx.recv().await {
            match event {
                SchedulerEvent::Due(alerts) => {
                    tracing::debug!(count = alerts.len(), "dashboard recorded due alerts");
                    recent.record(alerts);
                }
            }
        }
    })
}

/// Build the dashboard router.
pub fn router(services: TaskServices, recent: RecentAlerts) -> Router {
    let state = DashboardState { services, recent };

    Router::new()
        .route("/", get(index_page))
        .route("/health", get(dashboard_health))
        .route("/api/tasks", get(list_tasks).post(add_task))
        .route("/api/tasks/demo", post(run_demo_tasks))
        .route("/api/tasks/delete-completed", post(delete_completed))
        .route("/api/tasks/clear", post(clear_tasks))
        .route("/api/export.csv", get(export_csv))
        .route("/api/reminders/check", post(check_reminders))
        .route("/api/reminders/recent", get(recent_reminders))
        .route("/api/scheduler/start", post(start_scheduler))
        .route("/api/scheduler/stop", post(stop_scheduler))
        .route("/api/scheduler/status", get(scheduler_status))
        .with_state(state)
}

/// Serve the dashboard until Ctrl+C, then stop the scheduler.
pub async fn run_dashboard(
    config: &DashboardConfig,
    services: TaskServices,
    due_rx: mpsc::UnboundedReceiver<SchedulerEvent>,
) -> anyhow::Result<()> {
    let recent = RecentAlerts::new(config.recent_alert_limit);
    let collector = spawn_alert_collector(due_rx, recent.clone());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    let app = router(services.clone(), recent);

    tracing::info!("dashboard listening on http://{local_addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("received Ctrl+C, shutting down dashboard");
            }
        })
        .await?;

    services.scheduler().shutdown().await;
    collector.abort();
    Ok(())
}

/// Run a store-touching operation on the blocking pool.
async fn blocking<T, F>(services: &TaskServices, op: F) -> crate::error::Result<T>
where
    T: Send + 'static,
    F: FnOnce(TaskServices) -> crate::error::Result<T> + Send + 'static,
{
    let services = services.clone();
    tokio::task::spawn_blocking(move || op(services))
        .await
        .map_err(|e| NudgeError::Channel(format!("dashboard worker failed: {e}")))?
}

fn error_response(e: &NudgeError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match e {
        NudgeError::Input(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(serde_json::json!({"error": e.to_string()})))
}

async fn dashboard_health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok"
    }))
}

async fn list_tasks(State(state): State<DashboardState>) -> impl IntoResponse {
    let tasks = state.services.list();
    Json(serde_json::json!({"count": tasks.len(), "tasks": tasks}))
}

async fn add_task(
    State(state): State<DashboardState>,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    let added = match AddRequest::from_json(&body) {
        Ok(request) => blocking(&state.services, move |s| s.add(&request)).await,
        Err(e) => Err(e),
    };
    match added {
        Ok(task) => (
            StatusCode::CREATED,
            Json(serde_json::json!({"task": task})),
        ),
        Err(e) => error_response(&e),
    }
}

async fn run_demo_tasks(State(state): State<DashboardState>) -> impl IntoResponse {
    match blocking(&state.services, |s| s.run_demo()).await {
        Ok(tasks) => (
            StatusCode::CREATED,
            Json(serde_json::json!({"count": tasks.len(), "tasks": tasks})),
        ),
        Err(e) => error_response(&e),
    }
}

async fn delete_completed(State(state): State<DashboardState>) -> impl IntoResponse {
    match blocking(&state.services, |s| s.delete_completed()).await {
        Ok(removed) => (StatusCode::OK, Json(serde_json::json!({"removed": removed}))),
        Err(e) => error_response(&e),
    }
}

async fn clear_tasks(State(state): State<DashboardState>) -> impl IntoResponse {
    match blocking(&state.services, |s| s.clear()).await {
        Ok(removed) => (StatusCode::OK, Json(serde_json::json!({"removed": removed}))),
        Err(e) => error_response(&e),
    }
}

async fn export_csv(State(state): State<DashboardState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"tasks.csv\""),
        ],
        state.services.book().render_csv(),
    )
}

async fn check_reminders(State(state): State<DashboardState>) -> impl IntoResponse {
    let report = match blocking(&state.services, |s| Ok(s.check_now())).await {
        Ok(report) => report,
        Err(e) => return error_response(&e),
    };
    let messages: Vec<String> = report.fired.iter().map(DueAlert::message).collect();
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "fired": report.fired,
            "messages": messages,
            "skipped": report.skipped,
        })),
    )
}

async fn recent_reminders(State(state): State<DashboardState>) -> impl IntoResponse {
    Json(serde_json::json!({"alerts": state.recent.snapshot()}))
}

async fn start_scheduler(State(state): State<DashboardState>) -> impl IntoResponse {
    match state.services.start_scheduler() {
        Ok(outcome) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "state": "running",
                "already_running": outcome == StartOutcome::AlreadyRunning,
            })),
        ),
        Err(e) => error_response(&e),
    }
}

async fn stop_scheduler(State(state): State<DashboardState>) -> impl IntoResponse {
    let outcome = state.services.stop_scheduler();
    Json(serde_json::json!({
        "state": "stopped",
        "already_stopped": outcome == StopOutcome::AlreadyStopped,
    }))
}

async fn scheduler_status(State(state): State<DashboardState>) -> impl IntoResponse {
    Json(state.services.status())
}

async fn index_page(State(state): State<DashboardState>) -> impl IntoResponse {
    let status = state.services.status();
    Html(render_page(
        &state.services.list(),
        &state.recent.snapshot(),
        status.state == SchedulerState::Running,
    ))
}

const PAGE_SCRIPT: &str = r#"
async function call(method, path, body) {
  const opts = { method, headers: { "content-type": "application/json" } };
  if (body !== undefined) opts.body = JSON.stringify(body);
  const res = await fetch(path, opts);
  if (!res.ok) {
    const err = await res.json().catch(() => ({ error: res.statusText }));
    alert(err.error || res.statusText);
  }
  location.reload();
}
function addTask(ev) {
  ev.preventDefault();
  const f = ev.target;
  call("POST", "/api/tasks", {
    text: f.text.value,
    minutes: f.minutes.value,
    recurrence: f.recurrence.value,
  });
}
"#;

fn render_page(tasks: &[Task], recent: &[DueAlert], running: bool) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str("<!doctype html><html><head><meta charset=\"utf-8\">");
    html.push_str("<title>tasknudge</title>");
    html.push_str("<style>body{font-family:sans-serif;margin:2rem}table{border-collapse:collapse}");
    html.push_str("td,th{border:1px solid #ccc;padding:.3rem .6rem}.done{color:#888}</style>");
    html.push_str("<script>");
    html.push_str(PAGE_SCRIPT);
    html.push_str("</script></head><body>");
    html.push_str("<h1>Smart Task Reminder</h1>");

    html.push_str("<form onsubmit=\"addTask(event)\">");
    html.push_str("<input name=\"text\" placeholder=\"Describe the task\" size=\"40\">");
    html.push_str("<input name=\"minutes\" value=\"10\" size=\"4\"> minutes ");
    html.push_str("<select name=\"recurrence\">");
    for recurrence in crate::scheduler::recurrence::Recurrence::ALL {
        html.push_str(&format!("<option>{recurrence}</option>"));
    }
    html.push_str("</select> <button>Add Task</button></form><p>");
    html.push_str("<button onclick=\"call('POST','/api/tasks/demo')\">Run Demo Tasks</button> ");
    html.push_str("<button onclick=\"call('POST','/api/reminders/check')\">Check Reminders</button> ");
    if running {
        html.push_str("<button onclick=\"call('POST','/api/scheduler/stop')\">Stop Scheduler</button> ");
    } else {
        html.push_str("<button onclick=\"call('POST','/api/scheduler/start')\">Start Scheduler</button> ");
    }
    html.push_str("<button onclick=\"call('POST','/api/tasks/delete-completed')\">Delete Completed</button> ");
    html.push_str("<button onclick=\"call('POST','/api/tasks/clear')\">Clear All Tasks</button> ");
    html.push_str("<a href=\"/api/export.csv\">Export CSV</a></p>");

    if tasks.is_empty() {
        html.push_str("<p>No tasks added yet.</p>");
    } else {
        html.push_str("<table><tr><th>Task</th><th>Due</th><th>Category</th>");
        html.push_str("<th>Priority</th><th>Recurrence</th><th>Status</th></tr>");
        // Repeated descriptions show once, first occurrence wins.
        let mut seen = std::collections::HashSet::new();
        for task in tasks.iter().filter(|t| seen.insert(t.description.as_str())) {
            let class = if task.completed { " class=\"done\"" } else { "" };
            html.push_str(&format!(
                "<tr{class}><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(&task.description),
                escape_html(&task.due_clock()),
                task.category,
                task.priority,
                task.recurrence,
                if task.completed { "Completed" } else { "Pending" },
            ));
        }
        html.push_str("</table>");
    }

    if !recent.is_empty() {
        html.push_str("<h2>Recent reminders</h2><ul>");
        for alert in recent.iter().rev() {
            html.push_str(&format!("<li>{}</li>", escape_html(&alert.message())));
        }
        html.push_str("</ul>");
    }

    html.push_str("</body></html>");
    html
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
