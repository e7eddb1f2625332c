use uuid::Uuid;

use super::{CommitBatch, DocumentStore, Expect, ReadGuard, Result, WriteOp};
use crate::{domain::Document, errors::StoreError};

/// Read-then-write unit of work. Every read records the version it observed;
/// the staged writes commit only if none of those documents changed since.
pub struct Transaction<'a> {
    store: &'a dyn DocumentStore,
    batch: CommitBatch,
}

impl<'a> Transaction<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            store,
            batch: CommitBatch::default(),
        }
    }

    pub fn get<T: Document>(&mut self, id: Uuid) -> Result<Option<T>> {
        let doc = self.store.get(T::COLLECTION, id)?;
        let expect = match &doc {
            Some(found) => Expect::Version(found.version),
            None => Expect::Absent,
        };
        self.guard(T::COLLECTION, id, expect);
        doc.map(|found| found.decode::<T>()).transpose()
    }

    pub fn set<T: Document>(&mut self, doc: &T) -> Result<()> {
        self.batch.writes.push(WriteOp::Put {
            collection: T::COLLECTION.to_string(),
            id: doc.id(),
            data: serde_json::to_value(doc)?,
        });
        Ok(())
    }

    pub fn delete<T: Document>(&mut self, id: Uuid) {
        self.batch.writes.push(WriteOp::Delete {
            collection: T::COLLECTION.to_string(),
            id,
        });
    }

    pub fn into_batch(self) -> CommitBatch {
        self.batch
    }

    fn guard(&mut self, collection: &str, id: Uuid, expect: Expect) {
        let existing = self
            .batch
            .reads
            .iter()
            .any(|guard| guard.collection == collection && guard.id == id);
        if !existing {
            self.batch.reads.push(ReadGuard {
                collection: collection.to_string(),
                id,
                expect,
            });
        }
    }
}

/// Runs `body` inside a transaction, retrying from scratch on commit conflicts.
///
/// An error returned by `body` aborts the attempt without writing anything.
/// After `max_attempts` conflicting commits the conflict itself is returned.
pub fn run_transaction<R, E, F>(
    store: &dyn DocumentStore,
    max_attempts: u32,
    mut body: F,
) -> std::result::Result<R, E>
where
    F: FnMut(&mut Transaction<'_>) -> std::result::Result<R, E>,
    E: From<StoreError>,
{
    let attempts = max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        let mut txn = Transaction::new(store);
        let value = body(&mut txn)?;
        match store.commit(txn.into_batch()) {
            Ok(_) => return Ok(value),
            Err(err) if err.is_conflict() && attempt < attempts => {
                tracing::debug!(attempt, error = %err, "transaction conflict, retrying");
            }
            Err(err) => return Err(E::from(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, Identifiable};
    use crate::storage::{self, MemoryStore};
    use std::cell::Cell;

    #[test]
    fn body_error_writes_nothing() {
        let store = MemoryStore::new();
        let category = Category::new("Gifts").unwrap();
        let result: std::result::Result<(), StoreError> =
            run_transaction(&store, 3, |txn| {
                txn.set(&category)?;
                Err(StoreError::Unavailable("abort".into()))
            });
        assert!(result.is_err());
        assert!(storage::fetch::<Category>(&store, category.id())
            .unwrap()
            .is_none());
    }

    #[test]
    fn conflicting_commit_is_retried() {
        let store = MemoryStore::new();
        let mut category = Category::new("Gifts").unwrap();
        storage::create(&store, &category).unwrap();
        let attempts = Cell::new(0);

        let result: std::result::Result<(), StoreError> =
            run_transaction(&store, 3, |txn| {
                attempts.set(attempts.get() + 1);
                let mut current = txn.get::<Category>(category.id)?.expect("exists");
                if attempts.get() == 1 {
                    // Concurrent writer sneaks in between read and commit.
                    category.name = "Presents".into();
                    storage::replace(&store, &category)?;
                }
                current.name.push_str(" & Cards");
                txn.set(&current)
            });

        result.unwrap();
        assert_eq!(attempts.get(), 2);
        let stored = storage::fetch::<Category>(&store, category.id)
            .unwrap()
            .unwrap();
        assert_eq!(stored.name, "Presents & Cards");
    }

    #[test]
    fn conflict_surfaces_after_attempts_exhausted() {
        let store = MemoryStore::new();
        let category = Category::new("Gifts").unwrap();
        storage::create(&store, &category).unwrap();

        let result: std::result::Result<(), StoreError> =
            run_transaction(&store, 2, |txn| {
                let current = txn.get::<Category>(category.id)?.expect("exists");
                storage::replace(&store, &current)?;
                txn.set(&current)
            });
        assert!(result.unwrap_err().is_conflict());
    }
}
