use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, Ordering},
        RwLock, RwLockReadGuard, RwLockWriteGuard,
    },
};

use chrono::Utc;
use crossbeam_channel::{unbounded, Sender};
use serde_json::Value;
use uuid::Uuid;

use super::{
    CollectionSnapshot, CommitBatch, DocumentStore, Expect, ReadGuard, Result, StoreSnapshot,
    StoredDocument, Subscription, WriteOp, SNAPSHOT_SCHEMA_VERSION,
};
use crate::errors::StoreError;

/// Callback run after writes are applied but before they become visible.
/// Returning an error rolls the writes back.
pub(crate) type CommitHook<'a> = &'a dyn Fn(&StoreSnapshot) -> Result<()>;

fn no_hook(_: &StoreSnapshot) -> Result<()> {
    Ok(())
}

#[derive(Debug, Clone)]
struct Entry {
    version: u64,
    seq: u64,
    data: Value,
}

#[derive(Default)]
struct State {
    collections: HashMap<String, HashMap<Uuid, Entry>>,
    next_version: u64,
    next_seq: u64,
    subscribers: HashMap<String, Vec<Sender<CollectionSnapshot>>>,
}

type UndoLog = Vec<(String, Uuid, Option<Entry>)>;

impl State {
    fn entry(&self, collection: &str, id: Uuid) -> Option<&Entry> {
        self.collections.get(collection)?.get(&id)
    }

    fn check(&self, guard: &ReadGuard) -> bool {
        let current = self.entry(&guard.collection, guard.id).map(|e| e.version);
        match (guard.expect, current) {
            (Expect::Absent, None) => true,
            (Expect::Exists, Some(_)) => true,
            (Expect::Version(expected), Some(actual)) => expected == actual,
            _ => false,
        }
    }

    fn documents(&self, collection: &str) -> Vec<StoredDocument> {
        let Some(docs) = self.collections.get(collection) else {
            return Vec::new();
        };
        let mut entries: Vec<_> = docs.iter().collect();
        entries.sort_by_key(|(_, entry)| entry.seq);
        entries
            .into_iter()
            .map(|(id, entry)| StoredDocument {
                id: *id,
                version: entry.version,
                data: entry.data.clone(),
            })
            .collect()
    }

    fn apply(&mut self, writes: Vec<WriteOp>, undo: &mut UndoLog) -> u64 {
        self.next_version += 1;
        let version = self.next_version;
        for write in writes {
            match write {
                WriteOp::Put {
                    collection,
                    id,
                    data,
                } => {
                    let docs = self.collections.entry(collection.clone()).or_default();
                    let seq = match docs.get(&id) {
                        Some(existing) => existing.seq,
                        None => {
                            self.next_seq += 1;
                            self.next_seq
                        }
                    };
                    let previous = docs.insert(id, Entry { version, seq, data });
                    undo.push((collection, id, previous));
                }
                WriteOp::Delete { collection, id } => {
                    let previous = self
                        .collections
                        .get_mut(&collection)
                        .and_then(|docs| docs.remove(&id));
                    undo.push((collection, id, previous));
                }
            }
        }
        version
    }

    fn rollback(&mut self, undo: UndoLog, version_before: u64) {
        for (collection, id, previous) in undo.into_iter().rev() {
            let docs = self.collections.entry(collection).or_default();
            match previous {
                Some(entry) => {
                    docs.insert(id, entry);
                }
                None => {
                    docs.remove(&id);
                }
            }
        }
        self.next_version = version_before;
    }

    fn snapshot(&self) -> StoreSnapshot {
        let collections: BTreeMap<_, _> = self
            .collections
            .keys()
            .map(|name| (name.clone(), self.documents(name)))
            .collect();
        StoreSnapshot {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            saved_at: Utc::now(),
            next_version: self.next_version,
            collections,
        }
    }

    fn notify<'a>(&mut self, collections: impl IntoIterator<Item = &'a str>) {
        for collection in collections {
            let snapshot = CollectionSnapshot {
                collection: collection.to_string(),
                documents: self.documents(collection),
            };
            if let Some(senders) = self.subscribers.get_mut(collection) {
                senders.retain(|sender| sender.send(snapshot.clone()).is_ok());
            }
        }
    }
}

/// In-process document store guarded by a single `RwLock`.
pub struct MemoryStore {
    state: RwLock<State>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
            available: AtomicBool::new(true),
        }
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self> {
        let store = Self::new();
        store.replace_all(snapshot)?;
        Ok(store)
    }

    /// Simulates losing (or regaining) the connection to the backend.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn export(&self) -> Result<StoreSnapshot> {
        Ok(self.read()?.snapshot())
    }

    /// Swaps the entire contents for `snapshot` and notifies every subscriber.
    pub fn replace_all(&self, snapshot: StoreSnapshot) -> Result<()> {
        if snapshot.schema_version > SNAPSHOT_SCHEMA_VERSION {
            return Err(StoreError::Schema(format!(
                "snapshot schema {} is newer than supported {}",
                snapshot.schema_version, SNAPSHOT_SCHEMA_VERSION
            )));
        }
        let mut state = self.write()?;
        let mut collections = HashMap::new();
        let mut seq = 0;
        let mut max_version = snapshot.next_version;
        for (name, documents) in snapshot.collections {
            let mut docs = HashMap::new();
            for doc in documents {
                seq += 1;
                max_version = max_version.max(doc.version);
                docs.insert(
                    doc.id,
                    Entry {
                        version: doc.version,
                        seq,
                        data: doc.data,
                    },
                );
            }
            collections.insert(name, docs);
        }
        state.collections = collections;
        state.next_version = state.next_version.max(max_version);
        state.next_seq = seq;

        let mut touched: HashSet<String> = state.collections.keys().cloned().collect();
        touched.extend(state.subscribers.keys().cloned());
        state.notify(touched.iter().map(String::as_str));
        Ok(())
    }

    pub(crate) fn commit_with(&self, batch: CommitBatch, hook: CommitHook<'_>) -> Result<u64> {
        let mut state = self.write()?;
        self.ensure_available()?;
        if let Some(failed) = batch.reads.iter().find(|guard| !state.check(guard)) {
            return Err(StoreError::conflict(&failed.collection, failed.id));
        }
        if batch.writes.is_empty() {
            return Ok(state.next_version);
        }

        let touched: HashSet<String> = batch
            .writes
            .iter()
            .map(|write| write.collection().to_string())
            .collect();
        let version_before = state.next_version;
        let mut undo = Vec::new();
        let version = state.apply(batch.writes, &mut undo);
        if let Err(err) = hook(&state.snapshot()) {
            state.rollback(undo, version_before);
            return Err(err);
        }
        state.notify(touched.iter().map(String::as_str));
        Ok(version)
    }

    pub(crate) fn insert_with(
        &self,
        collection: &str,
        id: Uuid,
        data: Value,
        hook: CommitHook<'_>,
    ) -> Result<u64> {
        let batch = single_write(collection, id, Expect::Absent, Some(data));
        self.commit_with(batch, hook).map_err(|err| match err {
            StoreError::Conflict { collection, id } => StoreError::AlreadyExists { collection, id },
            other => other,
        })
    }

    pub(crate) fn update_with(
        &self,
        collection: &str,
        id: Uuid,
        data: Value,
        hook: CommitHook<'_>,
    ) -> Result<u64> {
        let batch = single_write(collection, id, Expect::Exists, Some(data));
        self.commit_with(batch, hook).map_err(|err| match err {
            StoreError::Conflict { collection, id } => StoreError::NotFound { collection, id },
            other => other,
        })
    }

    pub(crate) fn delete_with(
        &self,
        collection: &str,
        id: Uuid,
        hook: CommitHook<'_>,
    ) -> Result<bool> {
        let batch = single_write(collection, id, Expect::Exists, None);
        match self.commit_with(batch, hook) {
            Ok(_) => Ok(true),
            Err(StoreError::Conflict { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn ensure_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("backend is offline".into()))
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.ensure_available()?;
        self.state
            .read()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))
    }
}

fn single_write(collection: &str, id: Uuid, expect: Expect, data: Option<Value>) -> CommitBatch {
    let write = match data {
        Some(data) => WriteOp::Put {
            collection: collection.to_string(),
            id,
            data,
        },
        None => WriteOp::Delete {
            collection: collection.to_string(),
            id,
        },
    };
    CommitBatch {
        reads: vec![ReadGuard {
            collection: collection.to_string(),
            id,
            expect,
        }],
        writes: vec![write],
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, collection: &str, id: Uuid) -> Result<Option<StoredDocument>> {
        let state = self.read()?;
        Ok(state.entry(collection, id).map(|entry| StoredDocument {
            id,
            version: entry.version,
            data: entry.data.clone(),
        }))
    }

    fn list(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        Ok(self.read()?.documents(collection))
    }

    fn insert(&self, collection: &str, id: Uuid, data: Value) -> Result<u64> {
        self.insert_with(collection, id, data, &no_hook)
    }

    fn update(&self, collection: &str, id: Uuid, data: Value) -> Result<u64> {
        self.update_with(collection, id, data, &no_hook)
    }

    fn delete(&self, collection: &str, id: Uuid) -> Result<bool> {
        self.delete_with(collection, id, &no_hook)
    }

    fn commit(&self, batch: CommitBatch) -> Result<u64> {
        self.commit_with(batch, &no_hook)
    }

    fn subscribe(&self, collection: &str) -> Result<Subscription> {
        let mut state = self.write()?;
        self.ensure_available()?;
        let (sender, receiver) = unbounded();
        let snapshot = CollectionSnapshot {
            collection: collection.to_string(),
            documents: state.documents(collection),
        };
        // Fresh channel with a live receiver, so this send cannot fail.
        let _ = sender.send(snapshot);
        state
            .subscribers
            .entry(collection.to_string())
            .or_default()
            .push(sender);
        Ok(Subscription::new(collection, receiver))
    }
}
