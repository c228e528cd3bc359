use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;

use crate::backend::{BackendError, DocumentStore, Snapshot, Subscription};
use crate::model::Task;

/// Error type for opening a live query
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("could not open live query on {collection}: {source}")]
    Subscribe {
        collection: String,
        source: BackendError,
    },
}

/// Map every document of a snapshot into a task.
///
/// Documents whose fields don't fit the task shape are skipped with a
/// warning rather than failing the whole snapshot.
pub fn tasks_from_snapshot(snapshot: &Snapshot) -> Vec<Task> {
    snapshot
        .documents
        .iter()
        .filter_map(|doc| match Task::from_document(doc) {
            Ok(task) => Some(task),
            Err(e) => {
                tracing::warn!(id = %doc.id, error = %e, "skipping malformed task document");
                None
            }
        })
        .collect()
}

/// Open a live query on `collection` and pass the full mapped task list to
/// `dispatch` for every snapshot, starting with the current one.
///
/// The subscription lives as long as the returned guard. No retry happens
/// here: reconnection is the store's business.
pub fn open<F>(store: &dyn DocumentStore, collection: &str, dispatch: F) -> Result<WatchGuard, WatchError>
where
    F: Fn(Vec<Task>) + Send + Sync + 'static,
{
    let closed = Arc::new(AtomicBool::new(false));
    let listener = {
        let closed = Arc::clone(&closed);
        move |snapshot: Snapshot| {
            // The store may still be mid-delivery when the guard closes
            if closed.load(Ordering::Acquire) {
                return;
            }
            let tasks = tasks_from_snapshot(&snapshot);
            tracing::trace!(count = tasks.len(), "snapshot received");
            dispatch(tasks);
        }
    };

    let subscription = store
        .subscribe(collection, Box::new(listener))
        .map_err(|source| {
            tracing::error!(collection, error = %source, "live query failed to open");
            WatchError::Subscribe {
                collection: collection.to_string(),
                source,
            }
        })?;
    tracing::debug!(collection, "live query opened");

    Ok(WatchGuard {
        collection: collection.to_string(),
        subscription: Some(subscription),
        closed,
    })
}

/// Owns a live query. Closing is idempotent and also happens on drop, so
/// every exit path from a screen tears the subscription down exactly once.
pub struct WatchGuard {
    collection: String,
    subscription: Option<Box<dyn Subscription>>,
    closed: Arc<AtomicBool>,
}

impl WatchGuard {
    pub fn close(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            self.closed.store(true, Ordering::Release);
            subscription.unsubscribe();
            tracing::debug!(collection = %self.collection, "live query closed");
        }
    }

    pub fn is_open(&self) -> bool {
        self.subscription.is_some()
    }
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        self.close();
    }
}

/// Receiving side of a dispatch channel that keeps only the newest list.
///
/// Several snapshots may queue up between two polls; only the last one
/// matters because each is complete.
pub struct SnapshotInbox {
    rx: mpsc::Receiver<Vec<Task>>,
}

/// A dispatch callback and the inbox it feeds
pub fn snapshot_channel() -> (impl Fn(Vec<Task>) + Send + Sync + 'static, SnapshotInbox) {
    let (tx, rx) = mpsc::channel();
    let dispatch = move |tasks: Vec<Task>| {
        // Receiver gone means the screen unmounted
        let _ = tx.send(tasks);
    };
    (dispatch, SnapshotInbox { rx })
}

impl SnapshotInbox {
    /// Drain everything queued and return the newest list, if any
    pub fn latest(&self) -> Option<Vec<Task>> {
        let mut newest = None;
        while let Ok(tasks) = self.rx.try_recv() {
            newest = Some(tasks);
        }
        newest
    }
}
