use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::common::{
    optional_text, require_amount, require_name, Displayable, Document, DomainError,
    Identifiable, NamedEntity,
};

/// A stocked product with its cost basis and on-hand quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: Uuid,
    pub name: String,
    pub original_value: f64,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_hint: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl InventoryItem {
    pub fn new(
        name: impl AsRef<str>,
        original_value: f64,
        quantity: u32,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id: Uuid::new_v4(),
            name: require_name("name", name.as_ref())?,
            original_value: require_amount("original value", original_value)?,
            quantity,
            category: None,
            image_url: None,
            image_hint: None,
            created_at: Utc::now(),
        })
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = optional_text(Some(category.into()));
        self
    }

    pub fn with_image(mut self, url: impl Into<String>, hint: Option<String>) -> Self {
        self.image_url = optional_text(Some(url.into()));
        self.image_hint = optional_text(hint);
        self
    }

    /// Cost basis of everything currently on the shelf.
    pub fn stock_value(&self) -> f64 {
        self.original_value * f64::from(self.quantity)
    }

    /// Applies a validated edit. Nothing changes when the patch is rejected.
    pub fn apply(&mut self, patch: ItemPatch) -> Result<(), DomainError> {
        let name = match patch.name {
            Some(name) => Some(require_name("name", &name)?),
            None => None,
        };
        let original_value = match patch.original_value {
            Some(value) => Some(require_amount("original value", value)?),
            None => None,
        };

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(value) = original_value {
            self.original_value = value;
        }
        if let Some(quantity) = patch.quantity {
            self.quantity = quantity;
        }
        if let Some(category) = patch.category {
            self.category = optional_text(category);
        }
        if let Some(image) = patch.image {
            match image {
                Some((url, hint)) => {
                    self.image_url = optional_text(Some(url));
                    self.image_hint = optional_text(hint);
                }
                None => {
                    self.image_url = None;
                    self.image_hint = None;
                }
            }
        }
        Ok(())
    }
}

impl Identifiable for InventoryItem {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for InventoryItem {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Displayable for InventoryItem {
    fn display_label(&self) -> String {
        match &self.category {
            Some(category) => format!("{} [{}] ({} in stock)", self.name, category, self.quantity),
            None => format!("{} ({} in stock)", self.name, self.quantity),
        }
    }
}

impl Document for InventoryItem {
    const COLLECTION: &'static str = "inventory_items";

    fn validate(&self) -> Result<(), DomainError> {
        require_name("name", &self.name)?;
        require_amount("original value", self.original_value)?;
        Ok(())
    }
}

/// Partial edit for an inventory item. `None` leaves a field untouched; the
/// nested options on `category` and `image` clear the value.
#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub original_value: Option<f64>,
    pub quantity: Option<u32>,
    pub category: Option<Option<String>>,
    pub image: Option<Option<(String, Option<String>)>>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.original_value.is_none()
            && self.quantity.is_none()
            && self.category.is_none()
            && self.image.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_trims_name_and_rejects_blank() {
        let item = InventoryItem::new("  Candle ", 4.5, 3).unwrap();
        assert_eq!(item.name, "Candle");
        assert_eq!(
            InventoryItem::new("   ", 1.0, 1),
            Err(DomainError::MissingField("name"))
        );
    }

    #[test]
    fn new_rejects_negative_cost() {
        let err = InventoryItem::new("Candle", -1.0, 3).unwrap_err();
        assert!(matches!(err, DomainError::Negative { .. }));
    }

    #[test]
    fn rejected_patch_leaves_item_untouched() {
        let mut item = InventoryItem::new("Candle", 4.5, 3).unwrap();
        let patch = ItemPatch {
            name: Some("Lamp".into()),
            original_value: Some(-2.0),
            ..ItemPatch::default()
        };
        assert!(item.apply(patch).is_err());
        assert_eq!(item.name, "Candle");
        assert_eq!(item.original_value, 4.5);
    }

    #[test]
    fn patch_clears_image_and_category() {
        let mut item = InventoryItem::new("Candle", 4.5, 3)
            .unwrap()
            .with_category("Home")
            .with_image("https://img.example/candle.png", Some("candle".into()));
        item.apply(ItemPatch {
            category: Some(None),
            image: Some(None),
            quantity: Some(9),
            ..ItemPatch::default()
        })
        .unwrap();
        assert_eq!(item.category, None);
        assert_eq!(item.image_url, None);
        assert_eq!(item.image_hint, None);
        assert_eq!(item.quantity, 9);
    }
}
