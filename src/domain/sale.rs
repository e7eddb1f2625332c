use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::common::{require_amount, Document, DomainError, Identifiable};
use super::item::InventoryItem;

/// A ledger entry recording units of an item sold at a price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: Uuid,
    pub inventory_item_id: Uuid,
    pub quantity: u32,
    pub selling_price: f64,
    pub transaction_date: DateTime<Utc>,
}

impl Sale {
    pub fn new(
        inventory_item_id: Uuid,
        quantity: u32,
        selling_price: f64,
        transaction_date: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        NewSale {
            inventory_item_id,
            quantity,
            selling_price,
            transaction_date,
        }
        .into_sale()
    }

    pub fn revenue(&self) -> f64 {
        self.selling_price * f64::from(self.quantity)
    }
}

impl Identifiable for Sale {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Document for Sale {
    const COLLECTION: &'static str = "sales_transactions";

    fn validate(&self) -> Result<(), DomainError> {
        if self.quantity == 0 {
            return Err(DomainError::ZeroQuantity("quantity"));
        }
        require_amount("selling price", self.selling_price)?;
        Ok(())
    }
}

/// Input for the sale-recording transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSale {
    pub inventory_item_id: Uuid,
    pub quantity: u32,
    pub selling_price: f64,
    pub transaction_date: DateTime<Utc>,
}

impl NewSale {
    /// Validates the draft and assigns a fresh identifier.
    pub fn into_sale(self) -> Result<Sale, DomainError> {
        if self.quantity == 0 {
            return Err(DomainError::ZeroQuantity("quantity"));
        }
        Ok(Sale {
            id: Uuid::new_v4(),
            inventory_item_id: self.inventory_item_id,
            quantity: self.quantity,
            selling_price: require_amount("selling price", self.selling_price)?,
            transaction_date: self.transaction_date,
        })
    }
}

/// A sale joined with the item it references, dated by calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedSale {
    pub sale_id: Uuid,
    pub item: InventoryItem,
    pub quantity: u32,
    pub selling_price: f64,
    pub date: NaiveDate,
    pub recorded_at: DateTime<Utc>,
}

impl EnrichedSale {
    pub fn revenue(&self) -> f64 {
        self.selling_price * f64::from(self.quantity)
    }

    /// Cost basis of the units sold.
    pub fn cost(&self) -> f64 {
        self.item.original_value * f64::from(self.quantity)
    }

    pub fn profit(&self) -> f64 {
        (self.selling_price - self.item.original_value) * f64::from(self.quantity)
    }
}
