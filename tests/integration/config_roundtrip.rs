//! Configuration files as users write them.

use crate::helpers::config_in;
use tasknudge::{AddRequest, NudgeConfig, TaskServices};

#[test]
fn partial_file_fills_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[scheduler]\ntick_interval_secs = 30\n\n[dashboard]\nport = 9000\n",
    )
    .expect("write config");

    let config = NudgeConfig::from_file(&path).expect("load");
    assert_eq!(config.scheduler.tick_interval_secs, 30);
    assert!(!config.scheduler.autostart);
    assert_eq!(config.dashboard.port, 9000);
    assert_eq!(config.dashboard.host, "127.0.0.1");
    assert!((config.intake.default_delay_minutes - 10.0).abs() < f64::EPSILON);
    assert_eq!(config.logging.level, "tasknudge=info");
}

#[test]
fn saved_config_drives_services() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = config_in(dir.path());
    config.intake.default_delay_minutes = 3.0;
    let path = dir.path().join("nested").join("config.toml");
    config.save_to_file(&path).expect("save");

    let loaded = NudgeConfig::load_or_default(Some(&path)).expect("load");
    let (services, _due_rx) = TaskServices::from_config(&loaded).expect("services");
    let task = services
        .add(&AddRequest::text("Water plants").with_minutes("soon"))
        .expect("add");

    let (created, due) = (
        chrono::Local::now().naive_local(),
        task.due_at().expect("due"),
    );
    let delay = due - created;
    assert!(delay <= chrono::Duration::minutes(3));
    assert!(delay > chrono::Duration::minutes(2));
    assert!(dir.path().join("tasks.json").exists());
}

#[test]
fn malformed_config_is_a_config_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[scheduler\ntick = ").expect("write config");
    assert!(matches!(
        NudgeConfig::from_file(&path),
        Err(tasknudge::NudgeError::Config(_))
    ));
}
