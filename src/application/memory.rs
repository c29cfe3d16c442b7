//! In-memory implementation of every port, for exercising the services
//! without a database.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::customer::{
    opening_balance_after_adjustment, CustomerPatch, CustomerView, DefaultProduct, NewCustomer,
};
use crate::domain::errors::DomainError;
use crate::domain::inventory::{InventoryItemView, InventoryView, NewInventory};
use crate::domain::ledger::{LedgerEntry, Reconciliation};
use crate::domain::order::{
    page_offset, ListResult, NewOrder, OrderFilter, OrderLineView, OrderView,
};
use crate::domain::payment::{NewPayment, PaymentFilter, PaymentView};
use crate::domain::ports::{
    BillImageStore, CustomerRepository, InventoryRepository, OrderRepository, PaymentRepository,
    ProductRepository, StoredImage,
};
use crate::domain::pricing::{plan, stored_overrides, PriceIncrement, PropagationOutcome};
use crate::domain::product::{NewProduct, ProductPatch, ProductView, Unit};

#[derive(Default)]
struct MemoryState {
    products: Vec<ProductView>,
    customers: Vec<CustomerView>,
    orders: Vec<OrderView>,
    payments: Vec<PaymentView>,
    inventory: Vec<InventoryView>,
    propagations: HashMap<Uuid, PropagationOutcome>,
    images: HashMap<String, Vec<u8>>,
}

impl MemoryState {
    fn customer_mut(&mut self, id: Uuid) -> Result<&mut CustomerView, DomainError> {
        self.customers
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(DomainError::NotFound("Customer"))
    }

    fn product_name(&self, id: Uuid) -> Result<String, DomainError> {
        self.products
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.name.clone())
            .ok_or_else(|| DomainError::Conflict(format!("product {id} does not exist")))
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap()
    }

    pub fn seed_product(&self, name: &str, price: &str) -> Uuid {
        let product = ProductView {
            id: Uuid::new_v4(),
            name: name.to_string(),
            unit: Unit::Litre,
            default_price: BigDecimal::from_str(price).unwrap(),
        };
        let id = product.id;
        self.lock().products.push(product);
        id
    }

    pub fn seed_customer(&self, name: &str, outstanding: &str, default_products: Vec<DefaultProduct>) -> Uuid {
        let outstanding = BigDecimal::from_str(outstanding).unwrap();
        CustomerRepository::create(
            self,
            NewCustomer {
                name: name.to_string(),
                phone: "98765-43210".to_string(),
                address: None,
                notes: None,
                outstanding_amount: outstanding,
                default_products,
            },
        )
        .unwrap()
        .id
    }

    pub fn seed_customer_with_phone(&self, name: &str, phone: &str) -> Uuid {
        let id = self.seed_customer(name, "0", vec![]);
        self.lock().customer_mut(id).unwrap().phone = phone.to_string();
        id
    }

    /// Overwrites the cached balance without touching the ledger.
    pub fn corrupt_outstanding(&self, id: Uuid, amount: &str) {
        self.lock().customer_mut(id).unwrap().outstanding_amount =
            BigDecimal::from_str(amount).unwrap();
    }

    pub fn customer(&self, id: Uuid) -> CustomerView {
        self.lock().customer_mut(id).unwrap().clone()
    }

    pub fn image_count(&self) -> usize {
        self.lock().images.len()
    }
}

fn order_matches(order: &OrderView, filter: &OrderFilter) -> bool {
    filter.customer_id.map_or(true, |c| order.customer_id == c)
        && filter.billed_by.as_ref().map_or(true, |b| order.billed_by.as_ref() == Some(b))
        && filter.is_return.map_or(true, |r| order.is_return == r)
        && filter.period.map_or(true, |p| p.contains(order.date))
}

fn payment_matches(payment: &PaymentView, filter: &PaymentFilter) -> bool {
    filter.customer_id.map_or(true, |c| payment.customer_id == c)
        && filter.mode_of_payment.map_or(true, |m| payment.mode_of_payment == m)
        && filter.paid_to.as_ref().map_or(true, |t| payment.paid_to.as_ref() == Some(t))
        && filter.period.map_or(true, |p| p.contains(payment.date))
}

impl CustomerRepository for MemoryStore {
    fn create(&self, customer: NewCustomer) -> Result<CustomerView, DomainError> {
        let view = CustomerView {
            id: Uuid::new_v4(),
            name: customer.name,
            phone: customer.phone,
            address: customer.address,
            notes: customer.notes,
            opening_balance: customer.outstanding_amount.clone(),
            outstanding_amount: customer.outstanding_amount,
            default_products: customer.default_products,
        };
        self.lock().customers.push(view.clone());
        Ok(view)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<CustomerView>, DomainError> {
        Ok(self.lock().customers.iter().find(|c| c.id == id).cloned())
    }

    fn list(&self) -> Result<Vec<CustomerView>, DomainError> {
        Ok(self.lock().customers.clone())
    }

    fn update(&self, id: Uuid, patch: CustomerPatch) -> Result<CustomerView, DomainError> {
        let mut state = self.lock();
        let c = state.customer_mut(id)?;
        if let Some(name) = patch.name {
            c.name = name;
        }
        if let Some(phone) = patch.phone {
            c.phone = phone;
        }
        if let Some(address) = patch.address {
            c.address = Some(address);
        }
        if let Some(notes) = patch.notes {
            c.notes = Some(notes);
        }
        if let Some(amount) = patch.outstanding_amount {
            c.opening_balance =
                opening_balance_after_adjustment(&c.opening_balance, &c.outstanding_amount, &amount);
            c.outstanding_amount = amount;
        }
        if let Some(dps) = patch.default_products {
            c.default_products = dps;
        }
        Ok(c.clone())
    }

    fn ledger(&self, id: Uuid) -> Result<Vec<LedgerEntry>, DomainError> {
        let state = self.lock();
        let orders = state.orders.iter().filter(|o| o.customer_id == id).map(LedgerEntry::from);
        let payments = state.payments.iter().filter(|p| p.customer_id == id).map(LedgerEntry::from);
        Ok(orders.chain(payments).collect())
    }

    fn reconcile(&self, id: Uuid) -> Result<Reconciliation, DomainError> {
        let entries = self.ledger(id)?;
        let mut state = self.lock();
        let c = state.customer_mut(id)?;
        let report =
            Reconciliation::check(id, &c.opening_balance, c.outstanding_amount.clone(), &entries);
        c.outstanding_amount = report.derived_balance.clone();
        Ok(report)
    }
}

impl ProductRepository for MemoryStore {
    fn create(&self, product: NewProduct) -> Result<ProductView, DomainError> {
        let view = ProductView {
            id: Uuid::new_v4(),
            name: product.name,
            unit: product.unit,
            default_price: product.default_price,
        };
        self.lock().products.push(view.clone());
        Ok(view)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<ProductView>, DomainError> {
        Ok(self.lock().products.iter().find(|p| p.id == id).cloned())
    }

    fn list(&self) -> Result<Vec<ProductView>, DomainError> {
        Ok(self.lock().products.clone())
    }

    fn update(&self, id: Uuid, patch: ProductPatch) -> Result<ProductView, DomainError> {
        let mut state = self.lock();
        let p = state
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(DomainError::NotFound("Product"))?;
        if let Some(name) = patch.name {
            p.name = name;
        }
        if let Some(unit) = patch.unit {
            p.unit = unit;
        }
        if let Some(price) = patch.default_price {
            p.default_price = price;
        }
        Ok(p.clone())
    }

    fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let mut state = self.lock();
        if state
            .orders
            .iter()
            .any(|o| o.lines.iter().any(|l| l.product_id == id))
        {
            return Err(DomainError::Conflict(format!(
                "product {id} is referenced by existing orders"
            )));
        }
        let before = state.products.len();
        state.products.retain(|p| p.id != id);
        if state.products.len() == before {
            return Err(DomainError::NotFound("Product"));
        }
        for c in state.customers.iter_mut() {
            c.default_products.retain(|dp| dp.product_id != id);
        }
        Ok(())
    }

    fn apply_price_increment(
        &self,
        increment: &PriceIncrement,
    ) -> Result<PropagationOutcome, DomainError> {
        let mut guard = self.lock();
        let state = &mut *guard;
        if let Some(done) = state.propagations.get(&increment.propagation_id) {
            if done.product_id != increment.product_id {
                return Err(DomainError::Conflict(format!(
                    "propagation {} was already used for product {}",
                    done.propagation_id, done.product_id
                )));
            }
            return Ok(PropagationOutcome {
                already_applied: true,
                ..done.clone()
            });
        }

        let product = state
            .products
            .iter_mut()
            .find(|p| p.id == increment.product_id)
            .ok_or(DomainError::NotFound("Product"))?;
        let overrides = stored_overrides(product.id, &state.customers);
        let price_plan = plan(product, &overrides, &increment.delta)?;
        price_plan.apply(product, &mut state.customers);

        let outcome = PropagationOutcome {
            propagation_id: increment.propagation_id,
            product_id: product.id,
            new_default_price: price_plan.new_default_price.clone(),
            overrides_updated: price_plan.overrides.len() as i32,
            already_applied: false,
        };
        state
            .propagations
            .insert(increment.propagation_id, outcome.clone());
        Ok(outcome)
    }
}

impl OrderRepository for MemoryStore {
    fn create(&self, order: NewOrder) -> Result<OrderView, DomainError> {
        let mut state = self.lock();
        let bill = order.bill();
        let effect = order.balance_effect();

        let lines = order
            .lines
            .iter()
            .map(|l| {
                Ok(OrderLineView {
                    id: Uuid::new_v4(),
                    product_id: l.product_id,
                    product_name: state.product_name(l.product_id)?,
                    rate_at_purchase: l.rate_at_purchase.clone(),
                    quantity: l.quantity.clone(),
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        let customer = state.customer_mut(order.customer_id)?;
        let outstanding_at_time = customer.outstanding_amount.clone();
        customer.outstanding_amount += effect;

        let view = OrderView {
            id: Uuid::new_v4(),
            customer_id: order.customer_id,
            date: order.date,
            billed_by: order.billed_by,
            is_return: order.is_return,
            bill,
            paid: order.paid,
            outstanding_at_time,
            created_at: Utc::now(),
            lines,
        };
        state.orders.push(view.clone());
        Ok(view)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        Ok(self.lock().orders.iter().find(|o| o.id == id).cloned())
    }

    fn list(&self, filter: &OrderFilter, page: i64, limit: i64) -> Result<ListResult, DomainError> {
        let mut matching: Vec<OrderView> = self
            .lock()
            .orders
            .iter()
            .filter(|o| order_matches(o, filter))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.date.cmp(&a.date));
        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(page_offset(page, limit) as usize)
            .take(limit as usize)
            .collect();
        Ok(ListResult { items, total })
    }

    fn find_all(&self, filter: &OrderFilter) -> Result<Vec<OrderView>, DomainError> {
        let mut matching: Vec<OrderView> = self
            .lock()
            .orders
            .iter()
            .filter(|o| order_matches(o, filter))
            .cloned()
            .collect();
        matching.sort_by(|a, b| (a.date, a.created_at, a.id).cmp(&(b.date, b.created_at, b.id)));
        Ok(matching)
    }

    fn delete(&self, id: Uuid) -> Result<OrderView, DomainError> {
        let mut state = self.lock();
        let pos = state
            .orders
            .iter()
            .position(|o| o.id == id)
            .ok_or(DomainError::NotFound("Order"))?;
        let order = state.orders.remove(pos);
        state.customer_mut(order.customer_id)?.outstanding_amount -= order.balance_effect();
        Ok(order)
    }
}

impl PaymentRepository for MemoryStore {
    fn create(&self, payment: NewPayment) -> Result<PaymentView, DomainError> {
        let mut state = self.lock();
        state.customer_mut(payment.customer_id)?.outstanding_amount += payment.balance_effect();
        let view = PaymentView {
            id: Uuid::new_v4(),
            customer_id: payment.customer_id,
            date: payment.date,
            amount: payment.amount,
            mode_of_payment: payment.mode_of_payment,
            paid_to: payment.paid_to,
            notes: payment.notes,
            created_at: Utc::now(),
        };
        state.payments.push(view.clone());
        Ok(view)
    }

    fn list(&self, filter: &PaymentFilter) -> Result<Vec<PaymentView>, DomainError> {
        Ok(self
            .lock()
            .payments
            .iter()
            .filter(|p| payment_matches(p, filter))
            .cloned()
            .collect())
    }

    fn delete(&self, id: Uuid) -> Result<PaymentView, DomainError> {
        let mut state = self.lock();
        let pos = state
            .payments
            .iter()
            .position(|p| p.id == id)
            .ok_or(DomainError::NotFound("Payment"))?;
        let payment = state.payments.remove(pos);
        state.customer_mut(payment.customer_id)?.outstanding_amount -= payment.balance_effect();
        Ok(payment)
    }
}

impl InventoryRepository for MemoryStore {
    fn add(&self, inventory: NewInventory) -> Result<InventoryView, DomainError> {
        let mut state = self.lock();
        let items = inventory
            .items
            .iter()
            .map(|i| {
                Ok(InventoryItemView {
                    product_id: i.product_id,
                    product_name: state.product_name(i.product_id)?,
                    quantity: i.quantity.clone(),
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;
        let view = InventoryView {
            id: Uuid::new_v4(),
            date: inventory.date,
            items,
        };
        state.inventory.push(view.clone());
        Ok(view)
    }

    fn list_for_date(&self, date: NaiveDate) -> Result<Vec<InventoryView>, DomainError> {
        Ok(self
            .lock()
            .inventory
            .iter()
            .filter(|i| i.date == date)
            .cloned()
            .collect())
    }
}

impl BillImageStore for MemoryStore {
    fn put(&self, bytes: &[u8], extension: &str) -> Result<StoredImage, DomainError> {
        let name = format!("{}.{extension}", Uuid::new_v4());
        self.lock().images.insert(name.clone(), bytes.to_vec());
        Ok(StoredImage {
            url: format!("memory://bills/{name}"),
            name,
        })
    }

    fn get(&self, name: &str) -> Result<Option<Vec<u8>>, DomainError> {
        Ok(self.lock().images.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use bigdecimal::Zero;

    use super::*;

    #[test]
    fn seeded_customer_balance_is_opening_balance() {
        let store = MemoryStore::default();
        let id = store.seed_customer("Ravi", "75.5", vec![]);
        let c = store.customer(id);
        assert_eq!(c.opening_balance, c.outstanding_amount);
        assert!(c.outstanding_amount > BigDecimal::zero());
    }
}
