//! Document store abstraction with optimistic multi-document commits and
//! live collection subscriptions.

pub mod json_backend;
pub mod memory;
pub mod transaction;

use std::time::Duration;

use chrono::{DateTime, Utc};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::{domain::Document, errors::StoreError};

pub use json_backend::{BackupInfo, JsonFileStore};
pub use memory::MemoryStore;
pub use transaction::{run_transaction, Transaction};

pub type Result<T> = std::result::Result<T, StoreError>;

pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// A raw document together with the version assigned by its last write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: Uuid,
    pub version: u64,
    pub data: Value,
}

impl StoredDocument {
    pub fn decode<T: Document>(&self) -> Result<T> {
        let doc: T = serde_json::from_value(self.data.clone())?;
        doc.validate().map_err(|err| {
            StoreError::Schema(format!("{} document {}: {}", T::COLLECTION, self.id, err))
        })?;
        Ok(doc)
    }
}

/// Full contents of one collection at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSnapshot {
    pub collection: String,
    pub documents: Vec<StoredDocument>,
}

impl CollectionSnapshot {
    pub fn decode_all<T: Document>(&self) -> Result<Vec<T>> {
        self.documents.iter().map(StoredDocument::decode).collect()
    }
}

/// Serialized form of every collection, used for files and backups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub schema_version: u32,
    pub saved_at: DateTime<Utc>,
    pub next_version: u64,
    pub collections: BTreeMap<String, Vec<StoredDocument>>,
}

/// State a document must be in for a commit to proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    Absent,
    Exists,
    Version(u64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadGuard {
    pub collection: String,
    pub id: Uuid,
    pub expect: Expect,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Put {
        collection: String,
        id: Uuid,
        data: Value,
    },
    Delete {
        collection: String,
        id: Uuid,
    },
}

impl WriteOp {
    pub fn collection(&self) -> &str {
        match self {
            WriteOp::Put { collection, .. } | WriteOp::Delete { collection, .. } => collection,
        }
    }
}

/// Preconditions plus writes applied as one indivisible unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitBatch {
    pub reads: Vec<ReadGuard>,
    pub writes: Vec<WriteOp>,
}

impl CommitBatch {
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Live feed of full collection snapshots.
pub struct Subscription {
    collection: String,
    receiver: Receiver<CollectionSnapshot>,
}

impl Subscription {
    pub(crate) fn new(collection: &str, receiver: Receiver<CollectionSnapshot>) -> Self {
        Self {
            collection: collection.to_string(),
            receiver,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Drains pending snapshots and returns the newest one, if any arrived.
    pub fn latest(&self) -> Option<CollectionSnapshot> {
        self.receiver.try_iter().last()
    }

    /// Waits for the next snapshot. `None` when the timeout expires or the store
    /// has been dropped.
    pub fn next_timeout(&self, timeout: Duration) -> Option<CollectionSnapshot> {
        match self.receiver.recv_timeout(timeout) {
            Ok(snapshot) => Some(snapshot),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

/// Collection-scoped persistence with an atomic commit primitive.
pub trait DocumentStore: Send + Sync {
    fn get(&self, collection: &str, id: Uuid) -> Result<Option<StoredDocument>>;
    fn list(&self, collection: &str) -> Result<Vec<StoredDocument>>;
    /// Creates a document, failing if the id is already taken.
    fn insert(&self, collection: &str, id: Uuid, data: Value) -> Result<u64>;
    /// Replaces an existing document.
    fn update(&self, collection: &str, id: Uuid, data: Value) -> Result<u64>;
    /// Removes a document, returning whether it existed.
    fn delete(&self, collection: &str, id: Uuid) -> Result<bool>;
    /// Applies every write or none. Fails with `StoreError::Conflict` when a
    /// read guard no longer holds.
    fn commit(&self, batch: CommitBatch) -> Result<u64>;
    /// Delivers the current snapshot immediately and again after each change.
    fn subscribe(&self, collection: &str) -> Result<Subscription>;
}

pub fn fetch<T: Document>(store: &dyn DocumentStore, id: Uuid) -> Result<Option<T>> {
    store
        .get(T::COLLECTION, id)?
        .map(|doc| doc.decode::<T>())
        .transpose()
}

pub fn fetch_all<T: Document>(store: &dyn DocumentStore) -> Result<Vec<T>> {
    store
        .list(T::COLLECTION)?
        .iter()
        .map(StoredDocument::decode)
        .collect()
}

pub fn create<T: Document>(store: &dyn DocumentStore, doc: &T) -> Result<u64> {
    store.insert(T::COLLECTION, doc.id(), serde_json::to_value(doc)?)
}

pub fn replace<T: Document>(store: &dyn DocumentStore, doc: &T) -> Result<u64> {
    store.update(T::COLLECTION, doc.id(), serde_json::to_value(doc)?)
}

pub fn remove<T: Document>(store: &dyn DocumentStore, id: Uuid) -> Result<bool> {
    store.delete(T::COLLECTION, id)
}
