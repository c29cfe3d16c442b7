use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;

use crate::domain::customer::CustomerView;
use crate::domain::inventory::{InventoryItemView, InventoryView};
use crate::domain::order::OrderView;
use crate::domain::payment::PaymentView;

/// Figures shown on the back-office landing page for one day.
#[derive(Debug, Clone)]
pub struct DailySnapshot {
    pub date: NaiveDate,
    pub inventory: Vec<InventoryItemView>,
    pub net_quantity_sold: BigDecimal,
    pub payments_collected: BigDecimal,
    pub total_outstanding: BigDecimal,
}

impl DailySnapshot {
    pub fn build(
        date: NaiveDate,
        inventory: Vec<InventoryView>,
        orders: &[OrderView],
        payments: &[PaymentView],
        customers: &[CustomerView],
    ) -> Self {
        Self {
            date,
            inventory: inventory.into_iter().flat_map(|e| e.items).collect(),
            net_quantity_sold: net_quantity_sold(orders),
            payments_collected: payments_collected(payments),
            total_outstanding: total_outstanding(customers),
        }
    }
}

/// Σ quantity over all order lines, returns counted negative.
pub fn net_quantity_sold(orders: &[OrderView]) -> BigDecimal {
    orders
        .iter()
        .flat_map(|o| o.lines.iter().map(move |l| (o.is_return, &l.quantity)))
        .fold(BigDecimal::zero(), |acc, (is_return, qty)| {
            if is_return {
                acc - qty
            } else {
                acc + qty
            }
        })
}

pub fn payments_collected(payments: &[PaymentView]) -> BigDecimal {
    payments
        .iter()
        .fold(BigDecimal::zero(), |acc, p| acc + &p.amount)
}

pub fn total_outstanding(customers: &[CustomerView]) -> BigDecimal {
    customers
        .iter()
        .fold(BigDecimal::zero(), |acc, c| acc + &c.outstanding_amount)
}
