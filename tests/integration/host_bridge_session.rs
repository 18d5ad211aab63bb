//! Full JSON-lines sessions through the host bridge.

use crate::helpers::temp_services;
use serde_json::{Value, json};
use tasknudge::host::contract::{CommandEnvelope, CommandName};
use tasknudge::host::stdio::run_bridge;
use tokio::io::AsyncReadExt;

fn line(request_id: &str, command: CommandName, payload: Value) -> String {
    let envelope = CommandEnvelope::new(request_id, command, payload);
    let mut json = serde_json::to_string(&envelope).expect("serialize command");
    json.push('\n');
    json
}

async fn run_session(script: &str) -> (Vec<Value>, tempfile::TempDir) {
    let (services, due_rx, dir) = temp_services();
    let (out_tx, mut out_rx) = tokio::io::duplex(256 * 1024);
    run_bridge(services, due_rx, script.as_bytes(), out_tx)
        .await
        .expect("bridge run");

    let mut raw = String::new();
    out_rx.read_to_string(&mut raw).await.expect("read output");
    let lines = raw
        .lines()
        .map(|l| serde_json::from_str(l).expect("every output line is JSON"))
        .collect();
    (lines, dir)
}

fn response<'a>(lines: &'a [Value], request_id: &str) -> &'a Value {
    lines
        .iter()
        .find(|l| l.get("request_id").and_then(Value::as_str) == Some(request_id))
        .unwrap_or_else(|| panic!("no response for {request_id}"))
}

fn events<'a>(lines: &'a [Value], name: &str) -> Vec<&'a Value> {
    lines
        .iter()
        .filter(|l| l.get("event").and_then(Value::as_str) == Some(name))
        .collect()
}

#[tokio::test]
async fn add_check_delete_export_session() {
    let export_dir = tempfile::tempdir().expect("tempdir");
    let export_path = export_dir.path().join("session.csv");

    let script = [
        line(
            "add",
            CommandName::TasksAdd,
            json!({"text": "Submit report", "minutes": 0}),
        ),
        line("demo", CommandName::TasksAddDemo, json!({})),
        line("list", CommandName::TasksList, json!({})),
        line("check", CommandName::SchedulerCheckNow, json!({})),
        line("delete", CommandName::TasksDeleteCompleted, json!({})),
        line(
            "export",
            CommandName::TasksExport,
            json!({"path": export_path.display().to_string()}),
        ),
        line("status", CommandName::SchedulerStatus, json!({})),
    ]
    .concat();

    let (lines, _dir) = run_session(&script).await;

    let add = response(&lines, "add");
    assert_eq!(add["ok"], true);
    let added_id = add["payload"]["task"]["id"].as_str().expect("id").to_owned();

    assert_eq!(response(&lines, "demo")["payload"]["count"], 2);
    assert_eq!(response(&lines, "list")["payload"]["count"], 3);
    assert_eq!(response(&lines, "check")["payload"]["fired"], json!([added_id]));
    assert_eq!(response(&lines, "delete")["payload"]["removed"], 1);
    assert_eq!(response(&lines, "export")["payload"]["rows"], 2);

    let status = &response(&lines, "status")["payload"];
    assert_eq!(status["state"], "stopped");
    assert_eq!(status["task_count"], 2);
    assert_eq!(status["pending_count"], 2);

    assert_eq!(events(&lines, "task.added").len(), 3);
    let due = events(&lines, "task.due");
    assert_eq!(due.len(), 1);
    assert_eq!(due[0]["payload"]["message"], "Task Due: Submit report");
    assert_eq!(events(&lines, "tasks.deleted").len(), 1);

    let csv = std::fs::read_to_string(&export_path).expect("export file");
    assert!(csv.starts_with("ID,Task,Due Time,Category,Priority,Recurrence,Completed\r\n"));
    assert!(csv.contains("Demo: Submit Capstone in 1 minute"));
    assert!(!csv.contains("Submit report"));
}

#[tokio::test]
async fn scheduler_lifecycle_over_the_bridge() {
    let script = [
        line("start-1", CommandName::SchedulerStart, json!({})),
        line("start-2", CommandName::SchedulerStart, json!({})),
        line("stop-1", CommandName::SchedulerStop, json!({})),
        line("stop-2", CommandName::SchedulerStop, json!({})),
        line("bye", CommandName::HostShutdown, json!({})),
    ]
    .concat();

    let (lines, _dir) = run_session(&script).await;

    assert_eq!(response(&lines, "start-1")["payload"]["already_running"], false);
    assert_eq!(response(&lines, "start-2")["payload"]["already_running"], true);
    assert_eq!(response(&lines, "stop-1")["payload"]["already_stopped"], false);
    assert_eq!(response(&lines, "stop-2")["payload"]["already_stopped"], true);
    assert_eq!(response(&lines, "bye")["payload"]["shutting_down"], true);
    assert_eq!(events(&lines, "scheduler.started").len(), 1);
    assert_eq!(events(&lines, "scheduler.stopped").len(), 1);
}

#[tokio::test]
async fn invalid_envelopes_are_answered_not_fatal() {
    let mut script = String::from(r#"{"v":7,"request_id":"old","command":"host.ping","payload":{}}"#);
    script.push('\n');
    script.push_str(r#"{"v":1,"request_id":"typo","command":"tasks.lsit","payload":{}}"#);
    script.push('\n');
    script.push_str(&line("clear", CommandName::TasksClear, json!({})));

    let (lines, _dir) = run_session(&script).await;

    let old = response(&lines, "old");
    assert_eq!(old["ok"], false);
    assert!(old["error"].as_str().expect("error").contains("unsupported contract version"));

    // Unknown command names fail envelope parsing.
    assert_eq!(response(&lines, "parse-error")["ok"], false);

    let clear = response(&lines, "clear");
    assert_eq!(clear["ok"], true);
    assert_eq!(clear["payload"]["removed"], 0);
}
