//! Backend capabilities: a document store with live queries, and an
//! authentication provider.
//!
//! Everything above this module talks to the backend through the
//! [`DocumentStore`] and [`auth::AuthProvider`] traits, so screens and
//! operations can run against [`memory::MemoryStore`] in tests and
//! [`file_store::FileStore`] in the binary.

pub mod auth;
pub mod file_store;
pub mod memory;

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::io::lock::LockError;

/// Named fields of a document
pub type Fields = serde_json::Map<String, Value>;

/// A stored record: an opaque id and named fields
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

/// Complete point-in-time contents of a collection, in storage order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub documents: Vec<Document>,
}

/// Condition a write must satisfy against the stored document
#[derive(Debug, Clone, PartialEq)]
pub enum Precondition {
    /// The stored field must equal `value` (absent fields compare as null)
    FieldEquals { field: String, value: Value },
    /// The stored boolean field must equal `value` (absent reads as false)
    FlagEquals { field: String, value: bool },
}

/// Callback invoked with a full snapshot on every change to a collection
pub type SnapshotListener = Box<dyn Fn(Snapshot) + Send + Sync + 'static>;

/// A live query registration. Dropping it does not unsubscribe.
pub trait Subscription: Send {
    /// Stop delivering snapshots. Calling it twice is a no-op.
    fn unsubscribe(&mut self);
}

/// Error type for backend calls
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("no document {id} in {collection}")]
    NotFound { collection: String, id: String },
    #[error("{collection}/{id}: field {field} changed since it was read")]
    PreconditionFailed {
        collection: String,
        id: String,
        field: String,
    },
    #[error("invalid collection name: {0:?}")]
    InvalidCollection(String),
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("corrupt collection file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not watch {path}: {source}")]
    WatchError {
        path: PathBuf,
        source: notify::Error,
    },
    #[error(transparent)]
    Lock(#[from] LockError),
}

/// A document collection with id-addressed writes and live queries
pub trait DocumentStore: Send + Sync {
    /// Insert a document under a fresh id and return the id
    fn add(&self, collection: &str, fields: Fields) -> Result<String, BackendError>;

    /// Create or replace the document at `id`
    fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), BackendError>;

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, BackendError>;

    /// Current contents of the collection
    fn list(&self, collection: &str) -> Result<Snapshot, BackendError>;

    /// Merge `patch` into an existing document. Fails with `NotFound` if the
    /// document is missing and `PreconditionFailed` if the condition does
    /// not hold; in both cases nothing is written.
    fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Fields,
        precondition: Option<&Precondition>,
    ) -> Result<(), BackendError>;

    /// Remove a document. Removing a missing id succeeds.
    fn delete(&self, collection: &str, id: &str) -> Result<(), BackendError>;

    /// Register a live query. The listener receives the current snapshot
    /// before this returns, then a fresh snapshot after every change.
    fn subscribe(
        &self,
        collection: &str,
        listener: SnapshotListener,
    ) -> Result<Box<dyn Subscription>, BackendError>;
}

/// Generate a 20-character document id
pub fn new_document_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(20);
    id
}

/// Collection names become file names, so keep them to a safe alphabet
pub(crate) fn check_collection_name(name: &str) -> Result<(), BackendError> {
    let ok = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(BackendError::InvalidCollection(name.to_string()))
    }
}

/// Check `precondition` against the stored fields of `collection/id`
pub(crate) fn check_precondition(
    collection: &str,
    id: &str,
    stored: &Fields,
    precondition: Option<&Precondition>,
) -> Result<(), BackendError> {
    match precondition {
        None => Ok(()),
        Some(Precondition::FieldEquals { field, value }) => {
            let current = stored.get(field).unwrap_or(&Value::Null);
            if current == value {
                Ok(())
            } else {
                Err(precondition_failed(collection, id, field))
            }
        }
        Some(Precondition::FlagEquals { field, value }) => {
            let current = match stored.get(field) {
                None | Some(Value::Null) => Some(false),
                Some(v) => v.as_bool(),
            };
            if current == Some(*value) {
                Ok(())
            } else {
                Err(precondition_failed(collection, id, field))
            }
        }
    }
}

fn precondition_failed(collection: &str, id: &str, field: &str) -> BackendError {
    BackendError::PreconditionFailed {
        collection: collection.to_string(),
        id: id.to_string(),
        field: field.to_string(),
    }
}

/// Lock a mutex, recovering the data if a listener panicked while holding it
pub(crate) fn lock_unpoisoned<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
