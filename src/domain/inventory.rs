use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use uuid::Uuid;

use super::errors::DomainError;

#[derive(Debug, Clone)]
pub struct InventoryItemInput {
    pub product_id: Uuid,
    pub quantity: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct NewInventory {
    pub date: NaiveDate,
    pub items: Vec<InventoryItemInput>,
}

impl NewInventory {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.items.is_empty() {
            return Err(DomainError::invalid("inventory needs at least one item"));
        }
        if self.items.iter().any(|i| i.quantity <= BigDecimal::zero()) {
            return Err(DomainError::invalid("inventory quantity must be greater than zero"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct InventoryItemView {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct InventoryView {
    pub id: Uuid,
    pub date: NaiveDate,
    pub items: Vec<InventoryItemView>,
}
