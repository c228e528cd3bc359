use chrono::{NaiveDate, Utc};
use serde_json::Value;

use crate::backend::{BackendError, DocumentStore, Fields, Precondition};
use crate::model::date::{DateError, canonical_date};
use crate::model::task::{TASKS, Task, TaskDraft, TaskPatch, fields};

/// Error type for task operations
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("please fill all fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("nothing to update")]
    EmptyPatch,
    #[error(transparent)]
    InvalidDate(#[from] DateError),
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("task {0} was changed elsewhere, try again")]
    Conflict(String),
    #[error(transparent)]
    Backend(BackendError),
}

impl TaskError {
    /// True for errors caused by user input rather than the backend
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TaskError::MissingFields(_) | TaskError::EmptyPatch | TaskError::InvalidDate(_)
        )
    }
}

impl From<BackendError> for TaskError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::NotFound { id, .. } => TaskError::NotFound(id),
            BackendError::PreconditionFailed { id, .. } => TaskError::Conflict(id),
            other => TaskError::Backend(other),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Check a draft and turn it into the document to write. The date is
/// rewritten to `YYYY-MM-DD`.
pub fn validate_draft(draft: &TaskDraft, today: NaiveDate) -> Result<Fields, TaskError> {
    let mut missing = Vec::new();
    if is_blank(&draft.description) {
        missing.push(fields::DESCRIPTION);
    }
    if is_blank(&draft.time) {
        missing.push(fields::TIME);
    }
    let date = draft.date.as_deref().filter(|d| !is_blank(d));
    if date.is_none() {
        missing.push(fields::DATE);
    }
    let date = match date {
        Some(d) if missing.is_empty() => canonical_date(d, today)?,
        _ => return Err(TaskError::MissingFields(missing)),
    };

    let mut doc = Fields::new();
    doc.insert(fields::DESCRIPTION.into(), draft.description.trim().into());
    doc.insert(fields::TIME.into(), draft.time.trim().into());
    doc.insert(fields::DATE.into(), date.into());
    doc.insert(fields::COMPLETED.into(), false.into());
    doc.insert(fields::CREATED_AT.into(), Utc::now().to_rfc3339().into());
    Ok(doc)
}

/// Check a patch. Named fields must be non-blank; a named date is
/// rewritten to `YYYY-MM-DD`.
pub fn validate_patch(patch: &TaskPatch, today: NaiveDate) -> Result<Fields, TaskError> {
    if patch.is_empty() {
        return Err(TaskError::EmptyPatch);
    }
    let mut missing = Vec::new();
    if patch.description.as_deref().is_some_and(is_blank) {
        missing.push(fields::DESCRIPTION);
    }
    if patch.time.as_deref().is_some_and(is_blank) {
        missing.push(fields::TIME);
    }
    if patch.date.as_deref().is_some_and(is_blank) {
        missing.push(fields::DATE);
    }
    if !missing.is_empty() {
        return Err(TaskError::MissingFields(missing));
    }

    let normalized = TaskPatch {
        description: patch.description.as_ref().map(|s| s.trim().to_string()),
        time: patch.time.as_ref().map(|s| s.trim().to_string()),
        date: patch
            .date
            .as_deref()
            .map(|d| canonical_date(d, today))
            .transpose()?,
    };
    Ok(normalized.to_fields())
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Create a task and return its backend-assigned id. Nothing reaches the
/// backend if validation fails.
pub fn create_task(
    store: &dyn DocumentStore,
    draft: &TaskDraft,
    today: NaiveDate,
) -> Result<String, TaskError> {
    let doc = validate_draft(draft, today)?;
    let id = store.add(TASKS, doc)?;
    tracing::info!(%id, "task created");
    Ok(id)
}

/// Patch the named fields of an existing task
pub fn update_task(
    store: &dyn DocumentStore,
    id: &str,
    patch: &TaskPatch,
    today: NaiveDate,
) -> Result<(), TaskError> {
    let doc = validate_patch(patch, today)?;
    store.update(TASKS, id, doc, None)?;
    tracing::info!(%id, "task updated");
    Ok(())
}

/// Write `completed = !current` and return the written value.
///
/// The write only lands if the stored flag still equals `current`;
/// otherwise it fails with [`TaskError::Conflict`] and the caller should
/// wait for the next snapshot.
pub fn toggle_completion(
    store: &dyn DocumentStore,
    id: &str,
    current: bool,
) -> Result<bool, TaskError> {
    let next = !current;
    let mut patch = Fields::new();
    patch.insert(fields::COMPLETED.into(), Value::Bool(next));
    let precondition = Precondition::FlagEquals {
        field: fields::COMPLETED.into(),
        value: current,
    };
    match store.update(TASKS, id, patch, Some(&precondition)) {
        Ok(()) => {
            tracing::info!(%id, completed = next, "task toggled");
            Ok(next)
        }
        Err(e) => {
            tracing::warn!(%id, error = %e, "toggle rejected");
            Err(e.into())
        }
    }
}

/// Remove a task. Always forwarded; there is no local existence check.
pub fn delete_task(store: &dyn DocumentStore, id: &str) -> Result<(), TaskError> {
    store.delete(TASKS, id)?;
    tracing::info!(%id, "task deleted");
    Ok(())
}

/// Read one task directly from the backend
pub fn fetch_task(store: &dyn DocumentStore, id: &str) -> Result<Task, TaskError> {
    let doc = store
        .get(TASKS, id)?
        .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
    Task::from_document(&doc).map_err(|e| {
        tracing::warn!(%id, error = %e, "malformed task document");
        TaskError::NotFound(id.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::{MemoryStore, WriteRecord};
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 15).unwrap()
    }

    fn draft(description: &str, time: &str, date: Option<&str>) -> TaskDraft {
        TaskDraft {
            description: description.into(),
            time: time.into(),
            date: date.map(String::from),
        }
    }

    fn seeded(completed: bool) -> (MemoryStore, String) {
        let store = MemoryStore::new();
        let id = store
            .add(
                TASKS,
                json!({"description": "a", "date": "2024-05-01", "time": "9", "completed": completed})
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .unwrap();
        (store, id)
    }

    // --- create ---

    #[test]
    fn create_writes_canonical_document() {
        let store = MemoryStore::new();
        let id = create_task(&store, &draft(" Buy milk ", "9am", Some("2024-5-1")), today()).unwrap();

        let doc = store.get(TASKS, &id).unwrap().unwrap();
        assert_eq!(doc.fields["description"], "Buy milk");
        assert_eq!(doc.fields["time"], "9am");
        assert_eq!(doc.fields["date"], "2024-05-01");
        assert_eq!(doc.fields["completed"], false);
        assert!(doc.fields["created_at"].is_string());
    }

    #[test]
    fn create_with_missing_field_never_writes() {
        let store = MemoryStore::new();
        for bad in [
            draft("", "9am", Some("2024-05-01")),
            draft("x", "", Some("2024-05-01")),
            draft("x", "9am", None),
            draft("x", "9am", Some("  ")),
        ] {
            let err = create_task(&store, &bad, today()).unwrap_err();
            assert!(matches!(err, TaskError::MissingFields(_)), "{bad:?}");
            assert!(err.is_validation());
        }
        assert!(store.writes().is_empty());
    }

    #[test]
    fn missing_fields_are_all_named() {
        let err = validate_draft(&draft("", "", None), today()).unwrap_err();
        assert_eq!(err.to_string(), "please fill all fields: description, time, date");
    }

    #[test]
    fn whitespace_only_fields_count_as_missing() {
        let err = validate_draft(&draft("   ", "\t", Some("2024-05-01")), today()).unwrap_err();
        assert_eq!(err.to_string(), "please fill all fields: description, time");
    }

    #[test]
    fn create_with_bad_date_never_writes() {
        let store = MemoryStore::new();
        let err = create_task(&store, &draft("x", "9am", Some("someday")), today()).unwrap_err();
        assert!(matches!(err, TaskError::InvalidDate(_)));
        assert!(store.writes().is_empty());
    }

    // --- update ---

    #[test]
    fn update_patches_only_named_fields() {
        let (store, id) = seeded(true);
        let patch = TaskPatch {
            time: Some("10:30".into()),
            date: Some("today".into()),
            ..Default::default()
        };
        update_task(&store, &id, &patch, today()).unwrap();

        let task = fetch_task(&store, &id).unwrap();
        assert_eq!(task.description, "a");
        assert_eq!(task.time, "10:30");
        assert_eq!(task.date, "2025-02-15");
        assert!(task.completed);
    }

    #[test]
    fn update_unknown_id_is_not_found() {
        let store = MemoryStore::new();
        let patch = TaskPatch {
            description: Some("x".into()),
            ..Default::default()
        };
        let err = update_task(&store, "ghost", &patch, today()).unwrap_err();
        assert!(matches!(err, TaskError::NotFound(id) if id == "ghost"));
    }

    #[test]
    fn update_rejects_blank_and_empty_patches() {
        let (store, id) = seeded(false);
        let blank = TaskPatch {
            description: Some(" ".into()),
            ..Default::default()
        };
        assert!(matches!(
            update_task(&store, &id, &blank, today()),
            Err(TaskError::MissingFields(_))
        ));
        assert!(matches!(
            update_task(&store, &id, &TaskPatch::default(), today()),
            Err(TaskError::EmptyPatch)
        ));
        assert_eq!(store.writes().len(), 1); // only the seed
    }

    // --- toggle ---

    #[test]
    fn toggle_writes_negation_of_local_value() {
        let (store, id) = seeded(false);
        assert!(toggle_completion(&store, &id, false).unwrap());

        let last = store.writes().pop().unwrap();
        match last {
            WriteRecord::Update { patch, precondition, .. } => {
                assert_eq!(patch["completed"], true);
                assert_eq!(
                    precondition,
                    Some(Precondition::FlagEquals {
                        field: "completed".into(),
                        value: false
                    })
                );
            }
            other => panic!("unexpected write {other:?}"),
        }
        assert!(fetch_task(&store, &id).unwrap().completed);
    }

    #[test]
    fn toggle_with_stale_value_conflicts() {
        let (store, id) = seeded(true);
        // Local view still thinks it's incomplete; the write is issued but refused
        let err = toggle_completion(&store, &id, false).unwrap_err();
        assert!(matches!(err, TaskError::Conflict(_)));
        assert!(matches!(
            store.writes().pop(),
            Some(WriteRecord::Update { ref patch, .. }) if patch["completed"] == true
        ));
        assert!(fetch_task(&store, &id).unwrap().completed);
    }

    // --- delete ---

    #[test]
    fn delete_forwards_unknown_ids() {
        let store = MemoryStore::new();
        delete_task(&store, "not-in-view").unwrap();
        assert_eq!(
            store.writes(),
            vec![WriteRecord::Delete {
                collection: TASKS.into(),
                id: "not-in-view".into()
            }]
        );
    }

    #[test]
    fn delete_removes() {
        let (store, id) = seeded(false);
        delete_task(&store, &id).unwrap();
        assert!(matches!(fetch_task(&store, &id), Err(TaskError::NotFound(_))));
    }
}
