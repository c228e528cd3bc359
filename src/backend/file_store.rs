use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use indexmap::IndexMap;

use super::{
    BackendError, Document, DocumentStore, Fields, Precondition, Snapshot, SnapshotListener,
    Subscription, check_collection_name, check_precondition, lock_unpoisoned, new_document_id,
};
use crate::io::atomic::write_atomic;
use crate::io::lock::StoreLock;
use crate::io::watcher::FileWatcher;

/// Subdirectory of the data directory holding one JSON file per collection
pub const COLLECTIONS_DIR: &str = "collections";

type Collection = IndexMap<String, Fields>;

/// Document store backed by `collections/<name>.json` files.
///
/// Writers take the data directory's [`StoreLock`] for the whole
/// read-modify-write and commit by renaming a temp file over the collection,
/// so readers and watchers never see a partial file. Several processes may
/// share one data directory; each sees the others' writes through its
/// subscriptions.
#[derive(Debug, Clone)]
pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    pub fn open(data_dir: &Path) -> Result<Self, BackendError> {
        let dir = data_dir.join(COLLECTIONS_DIR);
        fs::create_dir_all(&dir).map_err(|e| BackendError::WriteError {
            path: dir.clone(),
            source: e,
        })?;
        Ok(FileStore {
            data_dir: data_dir.to_path_buf(),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn collection_path(&self, collection: &str) -> Result<PathBuf, BackendError> {
        check_collection_name(collection)?;
        Ok(self
            .data_dir
            .join(COLLECTIONS_DIR)
            .join(format!("{collection}.json")))
    }

    /// Read-modify-write one collection under the store lock. The file is
    /// only rewritten when `mutate` reports a change.
    fn modify<T>(
        &self,
        collection: &str,
        mutate: impl FnOnce(&mut Collection) -> Result<(T, bool), BackendError>,
    ) -> Result<T, BackendError> {
        let path = self.collection_path(collection)?;
        let _lock = StoreLock::acquire_default(&self.data_dir)?;
        let mut docs = read_collection(&path)?;
        let (out, changed) = mutate(&mut docs)?;
        if changed {
            write_collection(&path, &docs)?;
        }
        Ok(out)
    }
}

fn read_collection(path: &Path) -> Result<Collection, BackendError> {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Collection::new()),
        Err(e) => {
            return Err(BackendError::ReadError {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };
    serde_json::from_str(&text).map_err(|e| BackendError::Corrupt {
        path: path.to_path_buf(),
        source: e,
    })
}

fn write_collection(path: &Path, docs: &Collection) -> Result<(), BackendError> {
    let write_err = |source: std::io::Error| BackendError::WriteError {
        path: path.to_path_buf(),
        source,
    };
    let mut text = serde_json::to_vec_pretty(docs).map_err(|e| write_err(e.into()))?;
    text.push(b'\n');
    write_atomic(path, &text).map_err(write_err)
}

fn snapshot_of(docs: Collection) -> Snapshot {
    Snapshot {
        documents: docs
            .into_iter()
            .map(|(id, fields)| Document { id, fields })
            .collect(),
    }
}

fn not_found(collection: &str, id: &str) -> BackendError {
    BackendError::NotFound {
        collection: collection.to_string(),
        id: id.to_string(),
    }
}

impl DocumentStore for FileStore {
    fn add(&self, collection: &str, fields: Fields) -> Result<String, BackendError> {
        self.modify(collection, |docs| {
            let id = new_document_id();
            docs.insert(id.clone(), fields);
            Ok((id, true))
        })
    }

    fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), BackendError> {
        self.modify(collection, |docs| {
            docs.insert(id.to_string(), fields);
            Ok(((), true))
        })
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, BackendError> {
        let mut docs = read_collection(&self.collection_path(collection)?)?;
        Ok(docs.shift_remove(id).map(|fields| Document {
            id: id.to_string(),
            fields,
        }))
    }

    fn list(&self, collection: &str) -> Result<Snapshot, BackendError> {
        Ok(snapshot_of(read_collection(
            &self.collection_path(collection)?,
        )?))
    }

    fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Fields,
        precondition: Option<&Precondition>,
    ) -> Result<(), BackendError> {
        self.modify(collection, |docs| {
            let stored = docs.get_mut(id).ok_or_else(|| not_found(collection, id))?;
            check_precondition(collection, id, stored, precondition)?;
            stored.extend(patch);
            Ok(((), true))
        })
    }

    fn delete(&self, collection: &str, id: &str) -> Result<(), BackendError> {
        self.modify(collection, |docs| Ok(((), docs.shift_remove(id).is_some())))
    }

    fn subscribe(
        &self,
        collection: &str,
        listener: SnapshotListener,
    ) -> Result<Box<dyn Subscription>, BackendError> {
        let path = self.collection_path(collection)?;
        let deliver = Arc::new(SnapshotDelivery {
            path: path.clone(),
            listener,
            last: Mutex::new(None),
        });

        let on_change = {
            let deliver = Arc::clone(&deliver);
            move || deliver.deliver()
        };
        // Start watching before the initial read so no write slips between
        let watcher = FileWatcher::start(&path, on_change).map_err(|e| {
            BackendError::WatchError {
                path: path.clone(),
                source: e,
            }
        })?;
        deliver.deliver();

        tracing::debug!(collection, path = %path.display(), "file subscription opened");
        Ok(Box::new(FileSubscription {
            watcher: Some(watcher),
        }))
    }
}

/// Rereads a collection file and hands changed contents to the listener
struct SnapshotDelivery {
    path: PathBuf,
    listener: SnapshotListener,
    /// Last snapshot delivered; several notify events arrive per write
    last: Mutex<Option<Snapshot>>,
}

impl SnapshotDelivery {
    fn deliver(&self) {
        // Held across the read and the call: whoever reads last delivers
        // last, and every write is followed by a notify event
        let mut last = lock_unpoisoned(&self.last);
        let snapshot = match read_collection(&self.path) {
            Ok(docs) => snapshot_of(docs),
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable snapshot");
                return;
            }
        };
        if last.as_ref() == Some(&snapshot) {
            return;
        }
        *last = Some(snapshot.clone());
        (self.listener)(snapshot);
    }
}

struct FileSubscription {
    watcher: Option<FileWatcher>,
}

impl Subscription for FileSubscription {
    fn unsubscribe(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            tracing::debug!(path = %watcher.path().display(), "file subscription closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::mpsc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn fields(v: serde_json::Value) -> Fields {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn crud_round_trips_through_disk() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::open(tmp.path()).unwrap();

        let id = store.add("tasks", fields(json!({"description": "a", "completed": false}))).unwrap();
        store
            .update("tasks", &id, fields(json!({"completed": true})), None)
            .unwrap();

        let reopened = FileStore::open(tmp.path()).unwrap();
        let doc = reopened.get("tasks", &id).unwrap().unwrap();
        assert_eq!(doc.fields["description"], "a");
        assert_eq!(doc.fields["completed"], true);

        reopened.delete("tasks", &id).unwrap();
        assert!(store.list("tasks").unwrap().documents.is_empty());
    }

    #[test]
    fn missing_collection_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::open(tmp.path()).unwrap();
        assert_eq!(store.list("tasks").unwrap(), Snapshot::default());
        store.delete("tasks", "ghost").unwrap();
        assert!(!tmp.path().join("collections/tasks.json").exists());
    }

    #[test]
    fn update_missing_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::open(tmp.path()).unwrap();
        let err = store
            .update("tasks", "ghost", fields(json!({"a": 1})), None)
            .unwrap_err();
        assert!(matches!(err, BackendError::NotFound { .. }));
    }

    #[test]
    fn corrupt_file_is_reported() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::open(tmp.path()).unwrap();
        fs::write(tmp.path().join("collections/tasks.json"), "[oops").unwrap();
        assert!(matches!(
            store.list("tasks"),
            Err(BackendError::Corrupt { .. })
        ));
    }

    #[test]
    fn rejects_path_like_collection_names() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::open(tmp.path()).unwrap();
        assert!(matches!(
            store.list("../secrets"),
            Err(BackendError::InvalidCollection(_))
        ));
    }

    #[test]
    fn subscription_sees_writes_from_another_handle() {
        let tmp = TempDir::new().unwrap();
        let reader = FileStore::open(tmp.path()).unwrap();
        let writer = FileStore::open(tmp.path()).unwrap();

        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let mut sub = reader
            .subscribe(
                "tasks",
                Box::new(move |s: Snapshot| {
                    let _ = lock_unpoisoned(&tx).send(s.documents.len());
                }),
            )
            .unwrap();
        assert_eq!(rx.recv_timeout(Duration::from_secs(1)).unwrap(), 0);

        writer.add("tasks", fields(json!({"description": "x"}))).unwrap();
        let mut latest = 0;
        while let Ok(n) = rx.recv_timeout(Duration::from_secs(5)) {
            latest = n;
            if n == 1 {
                break;
            }
        }
        assert_eq!(latest, 1);

        sub.unsubscribe();
        sub.unsubscribe();
    }

    #[test]
    fn last_delivery_matches_the_settled_file() {
        let tmp = TempDir::new().unwrap();
        let reader = FileStore::open(tmp.path()).unwrap();

        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let _sub = reader
            .subscribe(
                "tasks",
                Box::new(move |s: Snapshot| {
                    let _ = lock_unpoisoned(&tx).send(s);
                }),
            )
            .unwrap();

        let writers: Vec<_> = (0..6)
            .map(|n| {
                let dir = tmp.path().to_path_buf();
                std::thread::spawn(move || {
                    let store = FileStore::open(&dir).unwrap();
                    store.add("tasks", fields(json!({"n": n}))).unwrap();
                })
            })
            .collect();
        for w in writers {
            w.join().unwrap();
        }

        // Drain until the watcher goes quiet
        let mut latest = None;
        while let Ok(s) = rx.recv_timeout(Duration::from_millis(750)) {
            latest = Some(s);
        }
        assert_eq!(latest.unwrap(), reader.list("tasks").unwrap());
    }
}
