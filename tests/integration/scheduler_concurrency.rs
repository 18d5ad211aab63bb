//! Background scheduler running against concurrent foreground mutation.

use crate::helpers::{next_due, temp_book, temp_services};
use chrono::Duration as ChronoDuration;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tasknudge::intake::NewTask;
use tasknudge::scheduler::runner::{Scheduler, SchedulerEvent, StartOutcome, StopOutcome};
use tasknudge::scheduler::tasks::{Category, Priority, now_local};
use tasknudge::{AddRequest, Recurrence, TaskStore};
use tokio::sync::mpsc;

fn long_overdue(description: &str, recurrence: Recurrence) -> NewTask {
    NewTask {
        description: description.to_owned(),
        delay_minutes: 0.0,
        category: Category::Work,
        priority: Priority::Medium,
        recurrence,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn recurring_task_is_never_deleted_while_scans_run() {
    const FIRINGS: usize = 20;

    let (book, _path, _dir) = temp_book();
    // Ten thousand days behind: every tick fires it again.
    let daily = book
        .add(
            long_overdue("daily standup", Recurrence::Daily),
            now_local() - ChronoDuration::days(10_000),
        )
        .expect("add")
        .id;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let scheduler =
        Scheduler::new(book.clone(), tx).with_tick_interval(Duration::from_millis(1));

    // The deleter keeps hammering until the scheduler has fired FIRINGS times.
    let done = Arc::new(AtomicBool::new(false));
    let deleter_book = book.clone();
    let deleter_done = Arc::clone(&done);
    let deleter = tokio::task::spawn_blocking(move || {
        let (mut removed, mut calls) = (0, 0_usize);
        while !deleter_done.load(Ordering::Acquire) {
            removed += deleter_book.delete_completed().expect("delete");
            calls += 1;
        }
        (removed, calls)
    });

    scheduler.start().expect("start");
    let mut fired = 0;
    while fired < FIRINGS {
        let SchedulerEvent::Due(alerts) = next_due(&mut rx).await;
        assert!(alerts.iter().all(|a| a.task_id() == daily));
        fired += alerts.len();
    }
    done.store(true, Ordering::Release);

    let (removed, calls) = deleter.await.expect("deleter thread");
    scheduler.shutdown().await;

    assert!(calls > 0);
    assert_eq!(removed, 0);
    let task = book.get(&daily).expect("recurring task survives");
    assert!(!task.completed);
}

#[tokio::test]
async fn scheduler_firing_is_persisted_before_the_alert_arrives() {
    let (book, path, _dir) = temp_book();
    let id = book
        .add(long_overdue("call friend", Recurrence::None), now_local())
        .expect("add")
        .id;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let scheduler =
        Scheduler::new(book.clone(), tx).with_tick_interval(Duration::from_millis(10));
    assert_eq!(scheduler.start().expect("start"), StartOutcome::Started);

    let SchedulerEvent::Due(alerts) = next_due(&mut rx).await;
    assert_eq!(alerts[0].task_id(), id);

    let stored = TaskStore::new(&path).load().expect("load");
    assert!(stored[0].completed);

    assert_eq!(scheduler.stop(), StopOutcome::Stopped);
    scheduler.shutdown().await;
}

#[tokio::test]
async fn stopped_scheduler_fires_nothing_new() {
    let (services, mut rx, _dir) = temp_services();
    services.start_scheduler().expect("start");
    services.stop_scheduler();
    services.scheduler().shutdown().await;

    services
        .add(&AddRequest::text("after stop").with_minutes("0"))
        .expect("add");
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(rx.try_recv().is_err());
    assert!(!services.list()[0].completed);
}

#[tokio::test]
async fn alerts_arrive_once_per_firing_in_scan_order() {
    let (services, mut rx, _dir) = temp_services();
    for text in ["first", "second", "third"] {
        services
            .add(&AddRequest::text(text).with_minutes("0"))
            .expect("add");
    }

    services.start_scheduler().expect("start");
    let SchedulerEvent::Due(alerts) = next_due(&mut rx).await;
    services.scheduler().shutdown().await;

    let names: Vec<&str> = alerts
        .iter()
        .map(|a| a.task.description.as_str())
        .collect();
    assert_eq!(names, vec!["first", "second", "third"]);
    assert!(rx.try_recv().is_err(), "one-shot tasks fire exactly once");
}
