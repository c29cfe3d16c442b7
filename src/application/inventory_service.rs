use chrono::NaiveDate;

use crate::domain::errors::DomainError;
use crate::domain::inventory::{InventoryView, NewInventory};
use crate::domain::ports::InventoryRepository;

pub struct InventoryService<I> {
    inventory: I,
}

impl<I: InventoryRepository> InventoryService<I> {
    pub fn new(inventory: I) -> Self {
        Self { inventory }
    }

    pub fn add_inventory(&self, inventory: NewInventory) -> Result<InventoryView, DomainError> {
        inventory.validate()?;
        let added = self.inventory.add(inventory)?;
        log::info!("inventory for {} recorded ({} items)", added.date, added.items.len());
        Ok(added)
    }

    pub fn list_inventory(&self, date: NaiveDate) -> Result<Vec<InventoryView>, DomainError> {
        self.inventory.list_for_date(date)
    }
}
