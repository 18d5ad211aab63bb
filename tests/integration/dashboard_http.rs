//! Dashboard endpoints over real HTTP.

use crate::helpers::temp_services;
use serde_json::{Value, json};
use std::net::SocketAddr;
use tasknudge::dashboard::{RecentAlerts, router, spawn_alert_collector};
use tasknudge::TaskServices;

struct TestDashboard {
    base: String,
    client: reqwest::Client,
    services: TaskServices,
    recent: RecentAlerts,
    _dir: tempfile::TempDir,
}

impl TestDashboard {
    async fn start() -> Self {
        let (services, due_rx, dir) = temp_services();
        let recent = RecentAlerts::new(10);
        let _collector = spawn_alert_collector(due_rx, recent.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr: SocketAddr = listener.local_addr().expect("local addr");
        let app = router(services.clone(), recent.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
            services,
            recent,
            _dir: dir,
        }
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{path}", self.base))
            .send()
            .await
            .expect("GET")
    }

    async fn post(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(format!("{}{path}", self.base))
            .json(&body)
            .send()
            .await
            .expect("POST")
    }

    async fn post_json(&self, path: &str, body: Value) -> Value {
        self.post(path, body).await.json().await.expect("json body")
    }
}

#[tokio::test]
async fn health_and_empty_index() {
    let dash = TestDashboard::start().await;

    let health: Value = dash.get("/health").await.json().await.expect("json");
    assert_eq!(health["status"], "ok");

    let page = dash.get("/").await.text().await.expect("html");
    assert!(page.contains("No tasks added yet."));
}

#[tokio::test]
async fn add_list_and_reject_empty() {
    let dash = TestDashboard::start().await;

    let created = dash
        .post(
            "/api/tasks",
            json!({"text": "Study chapter 4", "minutes": "45", "recurrence": "Weekly"}),
        )
        .await;
    assert_eq!(created.status(), reqwest::StatusCode::CREATED);
    let created: Value = created.json().await.expect("json");
    assert_eq!(created["task"]["category"], "Study");
    assert_eq!(created["task"]["recurrence"], "Weekly");

    let rejected = dash.post("/api/tasks", json!({"text": "  "})).await;
    assert_eq!(rejected.status(), reqwest::StatusCode::BAD_REQUEST);

    let listed: Value = dash.get("/api/tasks").await.json().await.expect("json");
    assert_eq!(listed["count"], 1);

    let page = dash.get("/").await.text().await.expect("html");
    assert!(page.contains("Study chapter 4"));
}

#[tokio::test]
async fn check_reminders_records_recent_alerts() {
    let dash = TestDashboard::start().await;
    dash.post("/api/tasks", json!({"text": "Pay rent", "minutes": 0}))
        .await;

    let checked = dash.post_json("/api/reminders/check", json!({})).await;
    assert_eq!(checked["messages"], json!(["Task Due: Pay rent"]));

    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        while dash.recent.snapshot().is_empty() {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("collector records the alert");

    let recent: Value = dash
        .get("/api/reminders/recent")
        .await
        .json()
        .await
        .expect("json");
    assert_eq!(recent["alerts"][0]["task"]["description"], "Pay rent");

    let removed = dash
        .post_json("/api/tasks/delete-completed", json!({}))
        .await;
    assert_eq!(removed["removed"], 1);
}

#[tokio::test]
async fn demo_export_and_clear() {
    let dash = TestDashboard::start().await;

    dash.post("/api/tasks", json!({"text": "left over"})).await;
    let demo = dash.post_json("/api/tasks/demo", json!({})).await;
    assert_eq!(demo["count"], 3);
    assert_eq!(demo["tasks"][0]["description"], "Submit Kaggle Capstone in 0.1 minute");

    let export = dash.get("/api/export.csv").await;
    assert_eq!(
        export
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
        Some("text/csv; charset=utf-8")
    );
    let csv = export.text().await.expect("csv");
    assert_eq!(csv.lines().count(), 4);
    assert!(!csv.contains("left over"));

    let cleared = dash.post_json("/api/tasks/clear", json!({})).await;
    assert_eq!(cleared["removed"], 3);
    assert!(dash.services.list().is_empty());
}

#[tokio::test]
async fn scheduler_controls() {
    let dash = TestDashboard::start().await;

    let started = dash.post_json("/api/scheduler/start", json!({})).await;
    assert_eq!(started["already_running"], false);

    let status: Value = dash
        .get("/api/scheduler/status")
        .await
        .json()
        .await
        .expect("json");
    assert_eq!(status["state"], "running");

    let stopped = dash.post_json("/api/scheduler/stop", json!({})).await;
    assert_eq!(stopped["already_stopped"], false);
    let again = dash.post_json("/api/scheduler/stop", json!({})).await;
    assert_eq!(again["already_stopped"], true);

    dash.services.scheduler().shutdown().await;
}
