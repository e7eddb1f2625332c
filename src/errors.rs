use thiserror::Error;
use uuid::Uuid;

/// Error type that captures document store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Document {id} not found in `{collection}`")]
    NotFound { collection: String, id: Uuid },
    #[error("Document {id} already exists in `{collection}`")]
    AlreadyExists { collection: String, id: Uuid },
    #[error("Transaction conflict on `{collection}` document {id}")]
    Conflict { collection: String, id: Uuid },
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Unsupported snapshot: {0}")]
    Schema(String),
    #[error("Invalid backup name `{0}`")]
    InvalidBackupName(String),
}

impl StoreError {
    pub fn not_found(collection: &str, id: Uuid) -> Self {
        StoreError::NotFound {
            collection: collection.to_string(),
            id,
        }
    }

    pub fn conflict(collection: &str, id: Uuid) -> Self {
        StoreError::Conflict {
            collection: collection.to_string(),
            id,
        }
    }

    /// Conflicts are resolved by re-running the whole transaction.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}
