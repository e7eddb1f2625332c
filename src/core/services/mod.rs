pub mod inventory_service;
pub mod ranking_service;
pub mod sales_service;
pub mod summary_service;

pub use inventory_service::{DeletePolicy, InventoryService};
pub use ranking_service::RankingService;
pub use sales_service::SalesService;
pub use summary_service::SummaryService;

use uuid::Uuid;

use crate::{domain::DomainError, errors::StoreError};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Coarse classification used when summarising a failure for the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Bad input or insufficient stock; nothing was written.
    Validation,
    /// A referenced record is missing; the operation was abandoned.
    Referential,
    /// The store could not commit; retrying the whole operation is safe.
    Transport,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("{0}")]
    Invalid(String),
    #[error("Not enough stock for `{item}`: {available} available, {requested} requested")]
    InsufficientStock {
        item: String,
        available: u32,
        requested: u32,
    },
    #[error("Inventory item {0} not found")]
    ItemNotFound(Uuid),
    #[error("Sale {0} not found")]
    SaleNotFound(Uuid),
    #[error("Sale {sale} references missing item {item}; stock cannot be restored")]
    MissingItemForSale { sale: Uuid, item: Uuid },
    #[error("Item `{name}` has {sales} recorded sale(s) and cannot be deleted")]
    ItemInUse { name: String, sales: usize },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ServiceError::Domain(_)
            | ServiceError::Invalid(_)
            | ServiceError::InsufficientStock { .. }
            | ServiceError::ItemInUse { .. } => FailureKind::Validation,
            ServiceError::ItemNotFound(_)
            | ServiceError::SaleNotFound(_)
            | ServiceError::MissingItemForSale { .. } => FailureKind::Referential,
            ServiceError::Store(StoreError::NotFound { .. }) => FailureKind::Referential,
            ServiceError::Store(StoreError::InvalidBackupName(_)) => FailureKind::Validation,
            ServiceError::Store(_) => FailureKind::Transport,
        }
    }

    /// Whether re-running the whole operation could succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind() == FailureKind::Transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_are_classified() {
        let stock = ServiceError::InsufficientStock {
            item: "Mug".into(),
            available: 1,
            requested: 2,
        };
        assert_eq!(stock.kind(), FailureKind::Validation);
        assert!(!stock.is_retryable());

        let missing = ServiceError::MissingItemForSale {
            sale: Uuid::new_v4(),
            item: Uuid::new_v4(),
        };
        assert_eq!(missing.kind(), FailureKind::Referential);

        let conflict = ServiceError::from(StoreError::conflict("inventory_items", Uuid::nil()));
        assert_eq!(conflict.kind(), FailureKind::Transport);
        assert!(conflict.is_retryable());

        let bad_name = ServiceError::from(StoreError::InvalidBackupName("../x.json".into()));
        assert_eq!(bad_name.kind(), FailureKind::Validation);
        assert!(!bad_name.is_retryable());
    }

    #[test]
    fn insufficient_stock_message_names_amounts() {
        let err = ServiceError::InsufficientStock {
            item: "Mug".into(),
            available: 1,
            requested: 3,
        };
        assert_eq!(
            err.to_string(),
            "Not enough stock for `Mug`: 1 available, 3 requested"
        );
    }
}
