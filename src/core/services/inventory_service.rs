//! Business logic helpers for managing inventory items and categories.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::services::{ServiceError, ServiceResult};
use crate::domain::{Category, InventoryItem, ItemPatch, Sale};
use crate::storage::{self, run_transaction, DocumentStore};

/// What happens to ledger entries when their item is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    /// Refuse while any sale references the item.
    #[default]
    Restrict,
    /// Delete anyway; the orphaned sales drop out of every report.
    Orphan,
}

impl std::str::FromStr for DeletePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "restrict" => Ok(DeletePolicy::Restrict),
            "orphan" => Ok(DeletePolicy::Orphan),
            other => Err(format!(
                "unknown delete policy `{}` (use restrict or orphan)",
                other
            )),
        }
    }
}

/// Provides validated CRUD helpers for inventory items.
pub struct InventoryService;

impl InventoryService {
    /// Stores a new item and returns its identifier.
    pub fn create_item(store: &dyn DocumentStore, item: InventoryItem) -> ServiceResult<Uuid> {
        storage::create(store, &item)?;
        tracing::info!(item = %item.id, name = %item.name, quantity = item.quantity, "item created");
        Ok(item.id)
    }

    pub fn get_item(store: &dyn DocumentStore, id: Uuid) -> ServiceResult<InventoryItem> {
        storage::fetch::<InventoryItem>(store, id)?.ok_or(ServiceError::ItemNotFound(id))
    }

    /// All items sorted by name (case-insensitive).
    pub fn list_items(store: &dyn DocumentStore) -> ServiceResult<Vec<InventoryItem>> {
        let mut items = storage::fetch_all::<InventoryItem>(store)?;
        items.sort_by_key(|item| item.name.to_lowercase());
        Ok(items)
    }

    /// Applies `patch` to the stored item inside a transaction. A sale
    /// committed between the read and the write forces a re-read, so the
    /// edit never writes back a stale quantity.
    pub fn update_item(
        store: &dyn DocumentStore,
        id: Uuid,
        patch: ItemPatch,
        attempts: u32,
    ) -> ServiceResult<InventoryItem> {
        if patch.is_empty() {
            return Err(ServiceError::Invalid("Nothing to update.".into()));
        }
        let item = run_transaction(store, attempts, |txn| {
            let mut item = txn
                .get::<InventoryItem>(id)?
                .ok_or(ServiceError::ItemNotFound(id))?;
            item.apply(patch.clone())?;
            txn.set(&item)?;
            Ok::<_, ServiceError>(item)
        })?;
        tracing::info!(item = %item.id, "item updated");
        Ok(item)
    }

    /// Deletes an item according to `policy`, returning the removed record.
    pub fn delete_item(
        store: &dyn DocumentStore,
        id: Uuid,
        policy: DeletePolicy,
        attempts: u32,
    ) -> ServiceResult<InventoryItem> {
        let removed = run_transaction(store, attempts, |txn| {
            let item = txn
                .get::<InventoryItem>(id)?
                .ok_or(ServiceError::ItemNotFound(id))?;
            let references = storage::fetch_all::<Sale>(store)?
                .iter()
                .filter(|sale| sale.inventory_item_id == id)
                .count();
            if references > 0 && policy == DeletePolicy::Restrict {
                return Err(ServiceError::ItemInUse {
                    name: item.name.clone(),
                    sales: references,
                });
            }
            txn.delete::<InventoryItem>(id);
            Ok::<_, ServiceError>((item, references))
        });

        let (item, references) = removed?;
        if references > 0 {
            tracing::warn!(item = %id, orphaned = references, "item deleted with recorded sales");
        } else {
            tracing::info!(item = %id, "item deleted");
        }
        Ok(item)
    }

    /// Adds a category unless one with the same name (ignoring case) exists.
    pub fn add_category(store: &dyn DocumentStore, name: &str) -> ServiceResult<Category> {
        let category = Category::new(name)?;
        let taken = storage::fetch_all::<Category>(store)?
            .iter()
            .any(|existing| existing.name.eq_ignore_ascii_case(&category.name));
        if taken {
            return Err(ServiceError::Invalid(format!(
                "Category `{}` already exists.",
                category.name
            )));
        }
        storage::create(store, &category)?;
        Ok(category)
    }

    pub fn list_categories(store: &dyn DocumentStore) -> ServiceResult<Vec<Category>> {
        let mut categories = storage::fetch_all::<Category>(store)?;
        categories.sort_by_key(|category| category.name.to_lowercase());
        Ok(categories)
    }
}
