use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::backend::{Document, Fields};

/// Name of the collection holding task documents
pub const TASKS: &str = "tasks";

/// Field names as stored on task documents
pub mod fields {
    pub const DESCRIPTION: &str = "description";
    pub const DATE: &str = "date";
    pub const TIME: &str = "time";
    pub const COMPLETED: &str = "completed";
    pub const CREATED_AT: &str = "created_at";
}

/// A task as seen by a screen: the document's fields with its id merged in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Backend-assigned document id
    pub id: String,
    #[serde(default)]
    pub description: String,
    /// Calendar date as stored. Legacy documents may carry other formats.
    #[serde(default)]
    pub date: String,
    /// Free text, no enforced format
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub completed: bool,
    /// Only present on documents written by code paths that stamp it
    #[serde(
        default,
        alias = "createdAt",
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Map a document into a task, merging the document id into `id`.
    ///
    /// The document id wins over any `id` field stored in the body.
    pub fn from_document(doc: &Document) -> Result<Task, serde_json::Error> {
        let mut body = doc.fields.clone();
        body.insert("id".to_string(), serde_json::Value::String(doc.id.clone()));
        serde_json::from_value(serde_json::Value::Object(body))
    }
}

/// Timestamps that are not RFC 3339 strings (e.g. a foreign timestamp
/// object) are treated as absent rather than failing the whole task.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc)))
}

/// Input for creating a task. `date` is `None` until the user picks one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub description: String,
    pub time: String,
    pub date: Option<String>,
}

/// A partial update: only `Some` fields are written
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub description: Option<String>,
    pub time: Option<String>,
    pub date: Option<String>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.time.is_none() && self.date.is_none()
    }

    /// The named fields as a document patch
    pub fn to_fields(&self) -> Fields {
        let mut out = Fields::new();
        if let Some(d) = &self.description {
            out.insert(fields::DESCRIPTION.into(), d.clone().into());
        }
        if let Some(t) = &self.time {
            out.insert(fields::TIME.into(), t.clone().into());
        }
        if let Some(d) = &self.date {
            out.insert(fields::DATE.into(), d.clone().into());
        }
        out
    }
}
