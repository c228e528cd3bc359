//! End-to-end sync tests over the file-backed store: live queries across
//! handles, grouping of legacy data, and the home screen lifecycle.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use taskmate::backend::DocumentStore;
use taskmate::backend::file_store::{COLLECTIONS_DIR, FileStore};
use taskmate::model::{TASKS, Task, TaskDraft};
use taskmate::ops::task_ops;
use taskmate::screen::HomeScreen;
use taskmate::sync::{self, group_by_date};

const WAIT: Duration = Duration::from_secs(5);

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

fn draft(description: &str, time: &str, date: &str) -> TaskDraft {
    TaskDraft {
        description: description.into(),
        time: time.into(),
        date: Some(date.into()),
    }
}

/// Copy a fixture in as the tasks collection
fn install_fixture(data_dir: &Path, name: &str) {
    let source = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    let dir = data_dir.join(COLLECTIONS_DIR);
    fs::create_dir_all(&dir).unwrap();
    fs::copy(&source, dir.join(format!("{TASKS}.json")))
        .unwrap_or_else(|e| panic!("Could not copy fixture {}: {}", name, e));
}

/// Receive snapshots until one satisfies `pred`
fn recv_until(rx: &mpsc::Receiver<Vec<Task>>, pred: impl Fn(&[Task]) -> bool) -> Vec<Task> {
    let deadline = Instant::now() + WAIT;
    loop {
        let left = deadline.saturating_duration_since(Instant::now());
        let tasks = rx
            .recv_timeout(left)
            .expect("timed out waiting for a matching snapshot");
        if pred(&tasks) {
            return tasks;
        }
    }
}

/// Tick the screen until `pred` holds
fn tick_until(screen: &mut HomeScreen, pred: impl Fn(&HomeScreen) -> bool) {
    let deadline = Instant::now() + WAIT;
    while !pred(screen) {
        assert!(Instant::now() < deadline, "timed out waiting for the screen");
        screen.tick();
        std::thread::sleep(Duration::from_millis(20));
    }
}

#[test]
fn legacy_collection_groups_by_literal_date() {
    let tmp = TempDir::new().unwrap();
    install_fixture(tmp.path(), "legacy_tasks.json");
    let store = FileStore::open(tmp.path()).unwrap();

    let tasks = sync::tasks_from_snapshot(&store.list(TASKS).unwrap());
    let ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["k1", "k2", "k3"]);
    assert!(tasks[1].created_at.is_some());
    assert!(tasks[2].created_at.is_none());

    let groups = group_by_date(&tasks);
    let shape: Vec<(&str, Vec<&str>)> = groups
        .iter()
        .map(|(date, ts)| (*date, ts.iter().map(|t| t.description.as_str()).collect()))
        .collect();
    assert_eq!(
        shape,
        vec![
            ("Wed May 01 2024", vec!["Buy milk", "Call mum"]),
            ("2024-05-03", vec!["Dentist"]),
        ]
    );
}

#[test]
fn live_query_sees_writes_from_another_handle() {
    let tmp = TempDir::new().unwrap();
    let reader = FileStore::open(tmp.path()).unwrap();
    let writer = FileStore::open(tmp.path()).unwrap();

    let (tx, rx) = mpsc::channel();
    let mut guard = sync::open(&reader, TASKS, move |tasks| {
        let _ = tx.send(tasks);
    })
    .unwrap();

    // Initial snapshot of an empty collection
    assert!(recv_until(&rx, |_| true).is_empty());

    let id = task_ops::create_task(&writer, &draft("Buy milk", "9am", "2024-5-1"), today()).unwrap();
    let tasks = recv_until(&rx, |ts| ts.len() == 1);
    assert_eq!(tasks[0].id, id);
    assert_eq!(tasks[0].date, "2024-05-01");
    assert!(!tasks[0].completed);

    task_ops::toggle_completion(&writer, &id, false).unwrap();
    recv_until(&rx, |ts| ts.first().is_some_and(|t| t.completed));

    guard.close();
    assert!(!guard.is_open());
    while rx.try_recv().is_ok() {}
    task_ops::delete_task(&writer, &id).unwrap();
    assert!(rx.recv_timeout(Duration::from_millis(300)).is_err());
}

#[test]
fn stale_toggle_is_rejected_across_handles() {
    let tmp = TempDir::new().unwrap();
    let a = FileStore::open(tmp.path()).unwrap();
    let b = FileStore::open(tmp.path()).unwrap();

    let id = task_ops::create_task(&a, &draft("Buy milk", "9am", "2024-05-01"), today()).unwrap();
    assert!(task_ops::toggle_completion(&a, &id, false).unwrap());

    // `b` still believes the task is open
    let err = task_ops::toggle_completion(&b, &id, false).unwrap_err();
    assert!(matches!(err, task_ops::TaskError::Conflict(_)));
    assert!(task_ops::fetch_task(&b, &id).unwrap().completed);
}

#[test]
fn home_screen_follows_the_store() {
    let tmp = TempDir::new().unwrap();
    let store = Arc::new(FileStore::open(tmp.path()).unwrap());
    let other = FileStore::open(tmp.path()).unwrap();

    let mut screen = HomeScreen::new(store.clone(), today());
    screen.mount().unwrap();
    tick_until(&mut screen, |s| s.state() == taskmate::screen::HomeState::Subscribed);
    assert!(screen.tasks().is_empty());

    // A write from elsewhere shows up
    task_ops::create_task(&other, &draft("Dentist", "2pm", "2024-05-03"), today()).unwrap();
    tick_until(&mut screen, |s| s.tasks().len() == 1);

    // A write through the screen round-trips through the live query
    screen.toggle();
    screen.wait_for_writes();
    tick_until(&mut screen, |s| s.tasks()[0].completed);
    assert!(screen.alert().is_none());

    screen.unmount();
    assert!(screen.tasks().is_empty());
    task_ops::create_task(&other, &draft("Gym", "7am", "2024-05-02"), today()).unwrap();
    std::thread::sleep(Duration::from_millis(200));
    assert!(!screen.tick());
    assert_eq!(other.list(TASKS).unwrap().documents.len(), 2);
}
