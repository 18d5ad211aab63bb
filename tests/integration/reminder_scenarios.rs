//! End-to-end reminder scenarios through the task book and its JSON store.

use crate::helpers::{t0, temp_book};
use chrono::Duration;
use tasknudge::intake::{AddRequest, DEFAULT_DELAY_MINUTES, KeywordParser, prepare};
use tasknudge::{Recurrence, TaskBook, TaskStore};

fn add(book: &TaskBook, text: &str, minutes: &str, recurrence: &str) -> String {
    let request = AddRequest::text(text)
        .with_minutes(minutes)
        .with_recurrence(recurrence);
    let new_task = prepare(&KeywordParser, &request, DEFAULT_DELAY_MINUTES).expect("prepare");
    book.add(new_task, t0()).expect("add").id
}

#[test]
fn one_shot_task_fires_once_and_stays_completed() {
    let (book, path, _dir) = temp_book();
    let id = add(&book, "Submit Capstone", "1", "None");

    let early = book.scan_due(t0() + Duration::seconds(59)).expect("scan");
    assert!(early.fired.is_empty());

    let report = book.scan_due(t0() + Duration::seconds(61)).expect("scan");
    assert_eq!(report.fired.len(), 1);
    assert_eq!(report.fired[0].task_id(), id);
    assert_eq!(report.fired[0].message(), "Task Due: Submit Capstone");

    let later = book.scan_due(t0() + Duration::hours(1)).expect("scan");
    assert!(later.fired.is_empty());

    let stored = TaskStore::new(&path).load().expect("load");
    assert!(stored[0].completed);
    assert_eq!(stored[0].due_at(), Some(t0() + Duration::minutes(1)));
}

#[test]
fn daily_task_is_rescheduled_and_persisted() {
    let (book, path, _dir) = temp_book();
    let id = add(&book, "Take vitamins", "1", "Daily");
    let first_due = t0() + Duration::minutes(1);

    let report = book.scan_due(t0() + Duration::seconds(61)).expect("scan");
    assert_eq!(report.fired.len(), 1);

    let stored = TaskStore::new(&path).load().expect("load");
    assert_eq!(stored[0].id, id);
    assert!(!stored[0].completed);
    assert_eq!(stored[0].due_at(), Some(first_due + Duration::hours(24)));

    let next_day = book
        .scan_due(first_due + Duration::hours(24) + Duration::seconds(1))
        .expect("scan");
    assert_eq!(next_day.fired.len(), 1);
    assert_eq!(
        book.get(&id).expect("task").due_at(),
        Some(first_due + Duration::hours(48))
    );
}

#[test]
fn k_firings_advance_by_k_offsets() {
    let (book, _path, _dir) = temp_book();
    let weekly = add(&book, "Laundry", "0", "Weekly");
    let monthly = add(&book, "Rent", "0", "Monthly");

    let mut now = t0();
    for _ in 0..4 {
        now += Duration::days(31);
        book.scan_due(now).expect("scan");
    }

    // Four scans, one occurrence each, whatever the backlog.
    assert_eq!(
        book.get(&weekly).expect("weekly").due_at(),
        Some(t0() + Duration::hours(4 * 168))
    );
    assert_eq!(
        book.get(&monthly).expect("monthly").due_at(),
        Some(t0() + Duration::hours(4 * 720))
    );
}

#[test]
fn delete_completed_spares_recurring_and_pending_tasks() {
    let (book, path, _dir) = temp_book();
    add(&book, "once", "0", "None");
    let daily = add(&book, "daily", "0", "Daily");
    let pending = add(&book, "pending", "90", "None");

    book.scan_due(t0() + Duration::minutes(1)).expect("scan");
    assert_eq!(book.delete_completed().expect("delete"), 1);

    let ids: Vec<String> = TaskStore::new(&path)
        .load()
        .expect("load")
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(ids, vec![daily, pending]);
}

#[test]
fn reopened_book_resumes_where_it_left_off() {
    let (book, path, _dir) = temp_book();
    add(&book, "Stand up and stretch", "5", "Daily");
    drop(book);

    let reopened = TaskBook::open(TaskStore::new(&path)).expect("reopen");
    let report = reopened.scan_due(t0() + Duration::minutes(5)).expect("scan");
    assert_eq!(report.fired.len(), 1);
    assert_eq!(report.fired[0].task.recurrence, Recurrence::Daily);
}
