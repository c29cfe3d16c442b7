use chrono::NaiveDate;
use uuid::Uuid;

use super::customer::{CustomerPatch, CustomerView, NewCustomer};
use super::errors::DomainError;
use super::inventory::{InventoryView, NewInventory};
use super::ledger::{LedgerEntry, Reconciliation};
use super::order::{ListResult, NewOrder, OrderFilter, OrderView};
use super::payment::{NewPayment, PaymentFilter, PaymentView};
use super::pricing::{PriceIncrement, PropagationOutcome};
use super::product::{NewProduct, ProductPatch, ProductView};

pub trait CustomerRepository: Send + Sync + 'static {
    fn create(&self, customer: NewCustomer) -> Result<CustomerView, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<CustomerView>, DomainError>;
    fn list(&self) -> Result<Vec<CustomerView>, DomainError>;
    fn update(&self, id: Uuid, patch: CustomerPatch) -> Result<CustomerView, DomainError>;
    /// Every order and payment recorded for the customer, unordered.
    fn ledger(&self, id: Uuid) -> Result<Vec<LedgerEntry>, DomainError>;
    /// Re-derives the cached outstanding amount from the ledger and rewrites
    /// it on drift, holding the customer row so no order or payment can
    /// commit in between.
    fn reconcile(&self, id: Uuid) -> Result<Reconciliation, DomainError>;
}

pub trait ProductRepository: Send + Sync + 'static {
    fn create(&self, product: NewProduct) -> Result<ProductView, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<ProductView>, DomainError>;
    fn list(&self) -> Result<Vec<ProductView>, DomainError>;
    fn update(&self, id: Uuid, patch: ProductPatch) -> Result<ProductView, DomainError>;
    fn delete(&self, id: Uuid) -> Result<(), DomainError>;
    /// Product price and stored customer overrides move together or not at
    /// all.
    fn apply_price_increment(
        &self,
        increment: &PriceIncrement,
    ) -> Result<PropagationOutcome, DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    /// Stores the order and applies its balance effect to the customer in
    /// one transaction. The returned order carries the balance snapshot
    /// taken just before the commit.
    fn create(&self, order: NewOrder) -> Result<OrderView, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError>;
    fn list(&self, filter: &OrderFilter, page: i64, limit: i64) -> Result<ListResult, DomainError>;
    /// All matching orders with their lines, oldest first.
    fn find_all(&self, filter: &OrderFilter) -> Result<Vec<OrderView>, DomainError>;
    /// Removes the order and reverses its balance effect.
    fn delete(&self, id: Uuid) -> Result<OrderView, DomainError>;
}

pub trait PaymentRepository: Send + Sync + 'static {
    fn create(&self, payment: NewPayment) -> Result<PaymentView, DomainError>;
    fn list(&self, filter: &PaymentFilter) -> Result<Vec<PaymentView>, DomainError>;
    fn delete(&self, id: Uuid) -> Result<PaymentView, DomainError>;
}

pub trait InventoryRepository: Send + Sync + 'static {
    fn add(&self, inventory: NewInventory) -> Result<InventoryView, DomainError>;
    fn list_for_date(&self, date: NaiveDate) -> Result<Vec<InventoryView>, DomainError>;
}

#[derive(Debug, Clone)]
pub struct StoredImage {
    pub name: String,
    pub url: String,
}

/// Object storage for rendered bill images.
pub trait BillImageStore: Send + Sync + 'static {
    fn put(&self, bytes: &[u8], extension: &str) -> Result<StoredImage, DomainError>;
    fn get(&self, name: &str) -> Result<Option<Vec<u8>>, DomainError>;
}
