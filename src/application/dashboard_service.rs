use chrono::NaiveDate;

use crate::billing::summary::DailySnapshot;
use crate::domain::errors::DomainError;
use crate::domain::order::OrderFilter;
use crate::domain::payment::PaymentFilter;
use crate::domain::period::DateRange;
use crate::domain::ports::{
    CustomerRepository, InventoryRepository, OrderRepository, PaymentRepository,
};

pub struct DashboardService<I, O, R, C> {
    inventory: I,
    orders: O,
    payments: R,
    customers: C,
}

impl<I, O, R, C> DashboardService<I, O, R, C>
where
    I: InventoryRepository,
    O: OrderRepository,
    R: PaymentRepository,
    C: CustomerRepository,
{
    pub fn new(inventory: I, orders: O, payments: R, customers: C) -> Self {
        Self {
            inventory,
            orders,
            payments,
            customers,
        }
    }

    pub fn snapshot(&self, date: NaiveDate) -> Result<DailySnapshot, DomainError> {
        let period = Some(DateRange::single(date));
        let inventory = self.inventory.list_for_date(date)?;
        let orders = self.orders.find_all(&OrderFilter {
            period,
            ..Default::default()
        })?;
        let payments = self.payments.list(&PaymentFilter {
            period,
            ..Default::default()
        })?;
        let customers = self.customers.list()?;
        Ok(DailySnapshot::build(
            date, inventory, &orders, &payments, &customers,
        ))
    }
}
