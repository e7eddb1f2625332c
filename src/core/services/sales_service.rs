//! Sale recording and reversal. Both run as optimistic store transactions so
//! the inventory quantity and the ledger always change together.

use uuid::Uuid;

use crate::core::services::{ServiceError, ServiceResult};
use crate::domain::{InventoryItem, NewSale, Sale};
use crate::storage::{self, run_transaction, DocumentStore};

pub const DEFAULT_TRANSACTION_ATTEMPTS: u32 = 5;

pub struct SalesService;

impl SalesService {
    /// Fast, non-authoritative stock check against a possibly stale item.
    /// `record_sale` re-validates inside its transaction regardless.
    pub fn precheck(item: &InventoryItem, quantity: u32) -> ServiceResult<()> {
        if quantity == 0 {
            return Err(ServiceError::Invalid("Quantity must be at least 1.".into()));
        }
        if item.quantity < quantity {
            return Err(ServiceError::InsufficientStock {
                item: item.name.clone(),
                available: item.quantity,
                requested: quantity,
            });
        }
        Ok(())
    }

    /// Decrements the item's stock and appends a sale in one commit.
    pub fn record_sale(
        store: &dyn DocumentStore,
        draft: &NewSale,
        attempts: u32,
    ) -> ServiceResult<Sale> {
        let sale = draft.clone().into_sale()?;
        let item_id = draft.inventory_item_id;

        let result = run_transaction(store, attempts, |txn| {
            let mut item = txn
                .get::<InventoryItem>(item_id)?
                .ok_or(ServiceError::ItemNotFound(item_id))?;
            let remaining = item.quantity.checked_sub(sale.quantity).ok_or_else(|| {
                ServiceError::InsufficientStock {
                    item: item.name.clone(),
                    available: item.quantity,
                    requested: sale.quantity,
                }
            })?;
            item.quantity = remaining;
            txn.set(&item)?;
            txn.set(&sale)?;
            Ok::<_, ServiceError>(remaining)
        });

        match result {
            Ok(remaining) => {
                tracing::info!(
                    sale = %sale.id,
                    item = %item_id,
                    quantity = sale.quantity,
                    remaining,
                    "sale recorded"
                );
                Ok(sale)
            }
            Err(err) => {
                tracing::warn!(item = %item_id, error = %err, "sale not recorded");
                Err(err)
            }
        }
    }

    /// Removes a sale and returns its units to stock in one commit. Fails
    /// without touching anything when the referenced item no longer exists.
    pub fn delete_sale(
        store: &dyn DocumentStore,
        sale_id: Uuid,
        attempts: u32,
    ) -> ServiceResult<Sale> {
        let result = run_transaction(store, attempts, |txn| {
            let sale = txn
                .get::<Sale>(sale_id)?
                .ok_or(ServiceError::SaleNotFound(sale_id))?;
            let mut item = txn.get::<InventoryItem>(sale.inventory_item_id)?.ok_or(
                ServiceError::MissingItemForSale {
                    sale: sale.id,
                    item: sale.inventory_item_id,
                },
            )?;
            item.quantity = item.quantity.checked_add(sale.quantity).ok_or_else(|| {
                ServiceError::Invalid(format!("Restoring stock for `{}` overflows", item.name))
            })?;
            txn.set(&item)?;
            txn.delete::<Sale>(sale.id);
            Ok::<_, ServiceError>(sale)
        });

        match &result {
            Ok(sale) => tracing::info!(
                sale = %sale.id,
                item = %sale.inventory_item_id,
                restored = sale.quantity,
                "sale deleted"
            ),
            Err(err) => tracing::warn!(sale = %sale_id, error = %err, "sale not deleted"),
        }
        result
    }

    /// Raw ledger entries, oldest first.
    pub fn list_sales(store: &dyn DocumentStore) -> ServiceResult<Vec<Sale>> {
        Ok(storage::fetch_all::<Sale>(store)?)
    }

    pub fn get_sale(store: &dyn DocumentStore, sale_id: Uuid) -> ServiceResult<Sale> {
        storage::fetch::<Sale>(store, sale_id)?.ok_or(ServiceError::SaleNotFound(sale_id))
    }
}
