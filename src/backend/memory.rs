use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use indexmap::IndexMap;

use super::{
    BackendError, Document, DocumentStore, Fields, Precondition, Snapshot, SnapshotListener,
    Subscription, check_collection_name, check_precondition, lock_unpoisoned, new_document_id,
};

type Collection = IndexMap<String, Fields>;

/// In-process document store.
///
/// Listeners run synchronously on the writing thread after the write has
/// been applied and the store lock released, so a listener may read the
/// store. A listener must not write to the store: deliveries to one
/// listener are serialized and a nested write would wait on itself.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, Collection>,
    listeners: HashMap<u64, (String, Arc<Delivery>)>,
    next_listener: u64,
    /// Bumped on every change to a collection, under the store lock
    versions: HashMap<String, u64>,
    /// Every write call, in order, for tests that assert on backend traffic
    writes: Vec<WriteRecord>,
}

/// A write call as the backend received it
#[derive(Debug, Clone, PartialEq)]
pub enum WriteRecord {
    Add {
        collection: String,
        id: String,
        fields: Fields,
    },
    Set {
        collection: String,
        id: String,
        fields: Fields,
    },
    Update {
        collection: String,
        id: String,
        patch: Fields,
        precondition: Option<Precondition>,
    },
    Delete {
        collection: String,
        id: String,
    },
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write calls received so far, including ones that failed
    pub fn writes(&self) -> Vec<WriteRecord> {
        lock_unpoisoned(&self.inner).writes.clone()
    }

    /// Number of live subscriptions on `collection`
    pub fn listener_count(&self, collection: &str) -> usize {
        lock_unpoisoned(&self.inner)
            .listeners
            .values()
            .filter(|(c, _)| c == collection)
            .count()
    }

    /// Apply `mutate` under the lock, then notify listeners if it changed
    /// the collection.
    fn write<T>(
        &self,
        collection: &str,
        record: WriteRecord,
        mutate: impl FnOnce(&mut Collection) -> Result<(T, bool), BackendError>,
    ) -> Result<T, BackendError> {
        check_collection_name(collection)?;
        let (out, notify) = {
            let mut guard = lock_unpoisoned(&self.inner);
            let inner = &mut *guard;
            inner.writes.push(record);
            let docs = inner.collections.entry(collection.to_string()).or_default();
            let (out, changed) = mutate(docs)?;
            let notify = if changed {
                let snapshot = snapshot_of(docs);
                let version = inner.versions.entry(collection.to_string()).or_default();
                *version += 1;
                let version = *version;
                let listeners: Vec<_> = inner
                    .listeners
                    .values()
                    .filter(|(c, _)| c == collection)
                    .map(|(_, l)| Arc::clone(l))
                    .collect();
                Some((version, snapshot, listeners))
            } else {
                None
            };
            (out, notify)
        };

        if let Some((version, snapshot, listeners)) = notify {
            for listener in listeners {
                listener.deliver(version, snapshot.clone());
            }
        }
        Ok(out)
    }
}

/// A listener plus the version of the last snapshot it was handed.
///
/// Writers race to deliver once the store lock is released, so a snapshot
/// older than one already delivered is dropped.
struct Delivery {
    listener: SnapshotListener,
    delivered: Mutex<Option<u64>>,
}

impl Delivery {
    fn new(listener: SnapshotListener) -> Self {
        Delivery {
            listener,
            delivered: Mutex::new(None),
        }
    }

    fn deliver(&self, version: u64, snapshot: Snapshot) {
        // Held across the call so a newer snapshot cannot be overtaken
        let mut delivered = lock_unpoisoned(&self.delivered);
        if delivered.is_some_and(|last| last >= version) {
            return;
        }
        *delivered = Some(version);
        (self.listener)(snapshot);
    }
}

fn snapshot_of(docs: &Collection) -> Snapshot {
    Snapshot {
        documents: docs
            .iter()
            .map(|(id, fields)| Document {
                id: id.clone(),
                fields: fields.clone(),
            })
            .collect(),
    }
}

impl DocumentStore for MemoryStore {
    fn add(&self, collection: &str, fields: Fields) -> Result<String, BackendError> {
        let id = new_document_id();
        let record = WriteRecord::Add {
            collection: collection.to_string(),
            id: id.clone(),
            fields: fields.clone(),
        };
        self.write(collection, record, |docs| {
            docs.insert(id.clone(), fields);
            Ok((id, true))
        })
    }

    fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), BackendError> {
        let record = WriteRecord::Set {
            collection: collection.to_string(),
            id: id.to_string(),
            fields: fields.clone(),
        };
        self.write(collection, record, |docs| {
            docs.insert(id.to_string(), fields);
            Ok(((), true))
        })
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, BackendError> {
        check_collection_name(collection)?;
        let inner = lock_unpoisoned(&self.inner);
        Ok(inner
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document {
                id: id.to_string(),
                fields: fields.clone(),
            }))
    }

    fn list(&self, collection: &str) -> Result<Snapshot, BackendError> {
        check_collection_name(collection)?;
        let inner = lock_unpoisoned(&self.inner);
        Ok(inner
            .collections
            .get(collection)
            .map(snapshot_of)
            .unwrap_or_default())
    }

    fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Fields,
        precondition: Option<&Precondition>,
    ) -> Result<(), BackendError> {
        let record = WriteRecord::Update {
            collection: collection.to_string(),
            id: id.to_string(),
            patch: patch.clone(),
            precondition: precondition.cloned(),
        };
        self.write(collection, record, |docs| {
            let stored = docs.get_mut(id).ok_or_else(|| BackendError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
            check_precondition(collection, id, stored, precondition)?;
            stored.extend(patch);
            Ok(((), true))
        })
    }

    fn delete(&self, collection: &str, id: &str) -> Result<(), BackendError> {
        let record = WriteRecord::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        };
        self.write(collection, record, |docs| {
            let removed = docs.shift_remove(id).is_some();
            Ok(((), removed))
        })
    }

    fn subscribe(
        &self,
        collection: &str,
        listener: SnapshotListener,
    ) -> Result<Box<dyn Subscription>, BackendError> {
        check_collection_name(collection)?;
        let listener = Arc::new(Delivery::new(listener));
        let (key, version, initial) = {
            let mut inner = lock_unpoisoned(&self.inner);
            let key = inner.next_listener;
            inner.next_listener += 1;
            inner
                .listeners
                .insert(key, (collection.to_string(), Arc::clone(&listener)));
            let initial = inner
                .collections
                .get(collection)
                .map(snapshot_of)
                .unwrap_or_default();
            let version = inner.versions.get(collection).copied().unwrap_or(0);
            (key, version, initial)
        };
        listener.deliver(version, initial);
        Ok(Box::new(MemorySubscription {
            store: Arc::downgrade(&self.inner),
            key: Some(key),
        }))
    }
}

struct MemorySubscription {
    store: Weak<Mutex<Inner>>,
    key: Option<u64>,
}

impl Subscription for MemorySubscription {
    fn unsubscribe(&mut self) {
        if let (Some(key), Some(store)) = (self.key.take(), self.store.upgrade()) {
            lock_unpoisoned(&store).listeners.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn fields(v: serde_json::Value) -> Fields {
        v.as_object().cloned().unwrap()
    }

    fn recorder() -> (Arc<Mutex<Vec<Snapshot>>>, SnapshotListener) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, Box::new(move |s| sink.lock().unwrap().push(s)))
    }

    #[test]
    fn add_get_list_keep_insertion_order() {
        let store = MemoryStore::new();
        let a = store.add("tasks", fields(json!({"n": 1}))).unwrap();
        let b = store.add("tasks", fields(json!({"n": 2}))).unwrap();
        assert_ne!(a, b);

        let ids: Vec<_> = store
            .list("tasks")
            .unwrap()
            .documents
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec![a.clone(), b]);
        assert_eq!(store.get("tasks", &a).unwrap().unwrap().fields["n"], 1);
        assert!(store.get("tasks", "nope").unwrap().is_none());
    }

    #[test]
    fn update_merges_named_fields() {
        let store = MemoryStore::new();
        let id = store.add("tasks", fields(json!({"a": 1, "b": 2}))).unwrap();
        store
            .update("tasks", &id, fields(json!({"b": 3})), None)
            .unwrap();
        let doc = store.get("tasks", &id).unwrap().unwrap();
        assert_eq!(doc.fields, fields(json!({"a": 1, "b": 3})));
    }

    #[test]
    fn update_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update("tasks", "ghost", fields(json!({"a": 1})), None)
            .unwrap_err();
        assert!(matches!(err, BackendError::NotFound { .. }));
    }

    #[test]
    fn failed_precondition_writes_nothing() {
        let store = MemoryStore::new();
        let id = store.add("tasks", fields(json!({"completed": true}))).unwrap();
        let pre = Precondition::FlagEquals {
            field: "completed".into(),
            value: false,
        };
        let err = store
            .update("tasks", &id, fields(json!({"completed": true})), Some(&pre))
            .unwrap_err();
        assert!(matches!(err, BackendError::PreconditionFailed { .. }));
        assert_eq!(
            store.get("tasks", &id).unwrap().unwrap().fields["completed"],
            true
        );
    }

    #[test]
    fn delete_missing_succeeds_and_is_recorded() {
        let store = MemoryStore::new();
        store.delete("tasks", "ghost").unwrap();
        assert_eq!(
            store.writes(),
            vec![WriteRecord::Delete {
                collection: "tasks".into(),
                id: "ghost".into()
            }]
        );
    }

    #[test]
    fn subscribe_delivers_initial_then_changes() {
        let store = MemoryStore::new();
        store.add("tasks", fields(json!({"n": 1}))).unwrap();

        let (seen, listener) = recorder();
        let _sub = store.subscribe("tasks", listener).unwrap();
        store.add("tasks", fields(json!({"n": 2}))).unwrap();
        store.add("users", fields(json!({"n": 3}))).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].documents.len(), 1);
        assert_eq!(seen[1].documents.len(), 2);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let store = MemoryStore::new();
        let (seen, listener) = recorder();
        let mut sub = store.subscribe("tasks", listener).unwrap();
        assert_eq!(store.listener_count("tasks"), 1);

        sub.unsubscribe();
        sub.unsubscribe();
        assert_eq!(store.listener_count("tasks"), 0);

        store.add("tasks", fields(json!({}))).unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn listener_may_read_the_store() {
        let store = MemoryStore::new();
        let reader = store.clone();
        let counts = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&counts);
        let _sub = store
            .subscribe(
                "tasks",
                Box::new(move |_| {
                    let n = reader.list("tasks").unwrap().documents.len();
                    sink.lock().unwrap().push(n);
                }),
            )
            .unwrap();
        store.add("tasks", fields(json!({}))).unwrap();
        assert_eq!(*counts.lock().unwrap(), vec![0, 1]);
    }

    #[test]
    fn concurrent_writers_deliver_the_final_state_last() {
        for _ in 0..50 {
            let store = MemoryStore::new();
            let ids: Vec<String> = (0..8)
                .map(|n| store.add("tasks", fields(json!({"n": n, "done": false}))).unwrap())
                .collect();

            let latest = Arc::new(Mutex::new(None));
            let sink = Arc::clone(&latest);
            let _sub = store
                .subscribe("tasks", Box::new(move |s| *sink.lock().unwrap() = Some(s)))
                .unwrap();

            let writers: Vec<_> = ids
                .into_iter()
                .map(|id| {
                    let store = store.clone();
                    std::thread::spawn(move || {
                        store
                            .update("tasks", &id, fields(json!({"done": true})), None)
                            .unwrap();
                    })
                })
                .collect();
            for w in writers {
                w.join().unwrap();
            }

            let delivered = latest.lock().unwrap().clone().unwrap();
            assert_eq!(delivered, store.list("tasks").unwrap());
        }
    }

    #[test]
    fn stale_snapshot_is_dropped() {
        let (seen, listener) = recorder();
        let delivery = Delivery::new(listener);
        delivery.deliver(2, Snapshot::default());
        delivery.deliver(1, Snapshot::default());
        delivery.deliver(3, Snapshot::default());
        assert_eq!(seen.lock().unwrap().len(), 2);
    }
}
