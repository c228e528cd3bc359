use std::sync::Arc;

use chrono::{Days, Months, NaiveDate};
use indexmap::IndexMap;

use crate::backend::DocumentStore;
use crate::model::date::{CANONICAL_FORMAT, parse_date};
use crate::model::{TASKS, Task, TaskDraft, TaskPatch};
use crate::ops::task_ops::{self, TaskError};
use crate::sync::{Scope, SnapshotInbox, WatchError, WatchGuard, group_by_date, snapshot_channel};

use super::form::{EntryForm, FormMode};

pub const FILL_ALL_FIELDS: &str = "Please fill all fields!";
pub const TASK_UPDATED: &str = "Task updated successfully!";

/// Where the home screen is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeState {
    Unmounted,
    /// Subscribed, waiting for the first snapshot
    Loading,
    Subscribed,
    CreateOpen,
    EditOpen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Info,
    Error,
}

/// A message the user has to dismiss
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
}

impl Alert {
    fn info(message: impl Into<String>) -> Self {
        Alert {
            kind: AlertKind::Info,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Alert {
            kind: AlertKind::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Toggle,
    Delete,
}

/// Completion of a write started from this screen
#[derive(Debug)]
pub struct MutationOutcome {
    pub kind: MutationKind,
    pub id: Option<String>,
    pub result: Result<(), TaskError>,
}

/// Controller for the home screen: the live task list, the calendar
/// cursor, the entry modal, and the writes issued from them.
///
/// The task list only ever changes by replacement from a snapshot. Writes
/// run in the background and their effect shows up with the next snapshot.
pub struct HomeScreen {
    store: Arc<dyn DocumentStore>,
    tasks: Vec<Task>,
    loaded: bool,
    today: NaiveDate,
    selected_date: NaiveDate,
    /// Index into `visible_tasks()`
    cursor: usize,
    form: Option<EntryForm>,
    alert: Option<Alert>,
    inbox: Option<SnapshotInbox>,
    watch: Option<WatchGuard>,
    mutations: Scope<MutationOutcome>,
}

impl HomeScreen {
    pub fn new(store: Arc<dyn DocumentStore>, today: NaiveDate) -> Self {
        HomeScreen {
            store,
            tasks: Vec::new(),
            loaded: false,
            today,
            selected_date: today,
            cursor: 0,
            form: None,
            alert: None,
            inbox: None,
            watch: None,
            mutations: Scope::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Open the live query. Mounting twice is a no-op.
    pub fn mount(&mut self) -> Result<(), WatchError> {
        if self.watch.is_some() {
            return Ok(());
        }
        let (dispatch, inbox) = snapshot_channel();
        let guard = crate::sync::open(self.store.as_ref(), TASKS, dispatch)?;
        if !self.mutations.is_live() {
            self.mutations = Scope::new();
        }
        self.inbox = Some(inbox);
        self.watch = Some(guard);
        self.loaded = false;
        Ok(())
    }

    /// Close the live query and drop view state. Writes still in flight
    /// complete, but their results are discarded.
    pub fn unmount(&mut self) {
        if let Some(mut guard) = self.watch.take() {
            guard.close();
        }
        self.mutations.close();
        self.inbox = None;
        self.tasks.clear();
        self.loaded = false;
        self.form = None;
        self.cursor = 0;
    }

    pub fn is_mounted(&self) -> bool {
        self.watch.is_some()
    }

    /// Apply the newest snapshot and any finished writes. Returns true if
    /// anything visible changed.
    pub fn tick(&mut self) -> bool {
        let mut changed = false;
        if let Some(tasks) = self.inbox.as_ref().and_then(|i| i.latest()) {
            self.tasks = tasks;
            self.loaded = true;
            self.clamp_cursor();
            changed = true;
        }
        for outcome in self.mutations.drain() {
            self.apply_outcome(outcome);
            changed = true;
        }
        changed
    }

    fn apply_outcome(&mut self, outcome: MutationOutcome) {
        match (outcome.kind, outcome.result) {
            (MutationKind::Update, Ok(())) => self.alert = Some(Alert::info(TASK_UPDATED)),
            (_, Ok(())) => {}
            (_, Err(TaskError::Conflict(_))) => {
                self.alert = Some(Alert::error("That task changed elsewhere. Try again."));
            }
            (kind, Err(e)) => {
                tracing::error!(?kind, id = ?outcome.id, error = %e, "write failed");
                self.alert = Some(Alert::error(format!("Something went wrong: {e}")));
            }
        }
    }

    /// Block until every write started so far has finished
    pub fn wait_for_writes(&mut self) {
        self.mutations.wait_idle();
    }

    pub fn pending_writes(&self) -> usize {
        self.mutations.pending()
    }

    pub fn state(&self) -> HomeState {
        match (&self.form, self.is_mounted(), self.loaded) {
            (Some(f), _, _) if f.is_edit() => HomeState::EditOpen,
            (Some(_), _, _) => HomeState::CreateOpen,
            (None, false, _) => HomeState::Unmounted,
            (None, true, false) => HomeState::Loading,
            (None, true, true) => HomeState::Subscribed,
        }
    }

    // -----------------------------------------------------------------------
    // View state
    // -----------------------------------------------------------------------

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn grouped(&self) -> IndexMap<&str, Vec<&Task>> {
        group_by_date(&self.tasks)
    }

    /// Tasks in the order the grouped list shows them
    pub fn visible_tasks(&self) -> Vec<&Task> {
        self.grouped().into_values().flatten().collect()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.visible_tasks().get(self.cursor).copied()
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn selected_date(&self) -> NaiveDate {
        self.selected_date
    }

    /// Dates that have at least one task, for marking the calendar
    pub fn dates_with_tasks(&self) -> Vec<NaiveDate> {
        self.grouped()
            .keys()
            .filter_map(|d| parse_date(d, self.today).ok())
            .collect()
    }

    pub fn form(&self) -> Option<&EntryForm> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut EntryForm> {
        self.form.as_mut()
    }

    pub fn alert(&self) -> Option<&Alert> {
        self.alert.as_ref()
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.visible_tasks().len();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        self.cursor = self.cursor.saturating_add_signed(delta).min(len - 1);
    }

    fn clamp_cursor(&mut self) {
        let len = self.visible_tasks().len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    pub fn select_date(&mut self, date: NaiveDate) {
        self.selected_date = date;
    }

    pub fn move_date(&mut self, days: i64) {
        let moved = if days >= 0 {
            self.selected_date.checked_add_days(Days::new(days.unsigned_abs()))
        } else {
            self.selected_date.checked_sub_days(Days::new(days.unsigned_abs()))
        };
        if let Some(d) = moved {
            self.selected_date = d;
        }
    }

    /// Same day of month, clamped to the target month's length
    pub fn move_month(&mut self, months: i32) {
        let moved = if months >= 0 {
            self.selected_date.checked_add_months(Months::new(months.unsigned_abs()))
        } else {
            self.selected_date.checked_sub_months(Months::new(months.unsigned_abs()))
        };
        if let Some(d) = moved {
            self.selected_date = d;
        }
    }

    pub fn select_today(&mut self) {
        self.selected_date = self.today;
    }

    // -----------------------------------------------------------------------
    // Modal
    // -----------------------------------------------------------------------

    pub fn open_create(&mut self) {
        self.form = Some(EntryForm::create());
    }

    /// Open the modal on the task under the cursor, selecting its date
    pub fn open_edit(&mut self) {
        let Some(task) = self.selected_task() else {
            return;
        };
        let form = EntryForm::edit(&task.id, &task.description, &task.time);
        let date = parse_date(&task.date, self.today);
        if let Ok(date) = date {
            self.selected_date = date;
        }
        self.form = Some(form);
    }

    pub fn cancel(&mut self) {
        self.form = None;
    }

    /// Validate the modal and issue the create or update. Validation
    /// failures keep the modal open and never reach the backend.
    pub fn submit(&mut self) {
        let Some(form) = self.form.as_ref() else {
            return;
        };
        let date = self.selected_date.format(CANONICAL_FORMAT).to_string();
        let description = form.description.text().to_string();
        let time = form.time.text().to_string();

        let job: Box<dyn FnOnce(&dyn DocumentStore) -> MutationOutcome + Send> = match &form.mode {
            FormMode::Create => {
                let draft = TaskDraft {
                    description,
                    time,
                    date: Some(date),
                };
                if let Err(e) = task_ops::validate_draft(&draft, self.today) {
                    self.alert = Some(validation_alert(&e));
                    return;
                }
                let today = self.today;
                Box::new(move |store: &dyn DocumentStore| {
                    let result = task_ops::create_task(store, &draft, today);
                    MutationOutcome {
                        kind: MutationKind::Create,
                        id: result.as_ref().ok().cloned(),
                        result: result.map(|_| ()),
                    }
                })
            }
            FormMode::Edit { id } => {
                let patch = TaskPatch {
                    description: Some(description),
                    time: Some(time),
                    date: Some(date),
                };
                if let Err(e) = task_ops::validate_patch(&patch, self.today) {
                    self.alert = Some(validation_alert(&e));
                    return;
                }
                let (id, today) = (id.clone(), self.today);
                Box::new(move |store: &dyn DocumentStore| MutationOutcome {
                    kind: MutationKind::Update,
                    result: task_ops::update_task(store, &id, &patch, today),
                    id: Some(id),
                })
            }
        };

        self.form = None;
        self.run(job);
    }

    // -----------------------------------------------------------------------
    // Row actions
    // -----------------------------------------------------------------------

    /// Flip completion of the task under the cursor, from its displayed value
    pub fn toggle(&mut self) {
        let Some(task) = self.selected_task() else {
            return;
        };
        let (id, current) = (task.id.clone(), task.completed);
        self.run(Box::new(move |store: &dyn DocumentStore| MutationOutcome {
            kind: MutationKind::Toggle,
            result: task_ops::toggle_completion(store, &id, current).map(|_| ()),
            id: Some(id),
        }));
    }

    /// Delete the task under the cursor. No confirmation.
    pub fn delete(&mut self) {
        let Some(task) = self.selected_task() else {
            return;
        };
        let id = task.id.clone();
        self.delete_id(id);
    }

    pub fn delete_id(&mut self, id: String) {
        self.run(Box::new(move |store: &dyn DocumentStore| MutationOutcome {
            kind: MutationKind::Delete,
            result: task_ops::delete_task(store, &id),
            id: Some(id),
        }));
    }

    fn run(&mut self, job: Box<dyn FnOnce(&dyn DocumentStore) -> MutationOutcome + Send>) {
        let store = Arc::clone(&self.store);
        self.mutations.spawn(move || job(store.as_ref()));
    }
}

impl Drop for HomeScreen {
    fn drop(&mut self) {
        self.unmount();
    }
}

fn validation_alert(e: &TaskError) -> Alert {
    match e {
        TaskError::MissingFields(_) | TaskError::EmptyPatch => Alert::error(FILL_ALL_FIELDS),
        other => Alert::error(other.to_string()),
    }
}
