//! Folding a customer's orders for a day (or range) into one statement.

use std::collections::HashMap;

use bigdecimal::{BigDecimal, Zero};
use uuid::Uuid;

use crate::domain::money::display_quantity;
use crate::domain::order::OrderView;

#[derive(Debug, Clone, PartialEq)]
pub struct MergedProductLine {
    pub product_id: Uuid,
    pub name: String,
    /// One entry per contributing order line, in processing order. Returns
    /// are negative.
    pub signed_quantities: Vec<BigDecimal>,
    pub net_quantity: BigDecimal,
    /// Σ signed quantity × rate at purchase, unrounded.
    pub net_amount: BigDecimal,
}

impl MergedProductLine {
    fn new(product_id: Uuid, name: &str) -> Self {
        Self {
            product_id,
            name: name.to_string(),
            signed_quantities: Vec::new(),
            net_quantity: BigDecimal::zero(),
            net_amount: BigDecimal::zero(),
        }
    }

    /// Printed form of the quantity sequence: the first entry as is, later
    /// positive entries prefixed with `+`, e.g. `["2", "-1", "+3"]`.
    pub fn quantity_tokens(&self) -> Vec<String> {
        self.signed_quantities
            .iter()
            .enumerate()
            .map(|(idx, q)| {
                let text = display_quantity(q);
                if idx > 0 && *q > BigDecimal::zero() {
                    format!("+{text}")
                } else {
                    text
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedBill {
    /// Ordered by the first appearance of each product.
    pub lines: Vec<MergedProductLine>,
    /// Σ order.bill as stored, ignoring the return flag.
    pub total_bill: BigDecimal,
    pub total_paid: BigDecimal,
    /// Balance immediately before the first merged order, taken from that
    /// order's snapshot; `None` when no orders matched. The daily bill
    /// replaces it with the ledger balance at that point.
    pub old_balance: Option<BigDecimal>,
    pub order_count: usize,
}

impl MergedBill {
    pub fn is_empty(&self) -> bool {
        self.order_count == 0
    }

    pub fn net_amount(&self) -> BigDecimal {
        self.lines
            .iter()
            .fold(BigDecimal::zero(), |acc, l| acc + &l.net_amount)
    }

    pub fn line(&self, product_id: Uuid) -> Option<&MergedProductLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }
}

/// The order orders are merged in: by date, then commit time, then id.
pub fn processing_order(orders: &[OrderView]) -> Vec<&OrderView> {
    let mut sorted: Vec<&OrderView> = orders.iter().collect();
    sorted.sort_by(|a, b| (a.date, a.created_at, a.id).cmp(&(b.date, b.created_at, b.id)));
    sorted
}

pub fn merge_orders(orders: &[OrderView]) -> MergedBill {
    let mut merged = MergedBill::default();
    let mut index: HashMap<Uuid, usize> = HashMap::new();

    for order in processing_order(orders) {
        if merged.old_balance.is_none() {
            merged.old_balance = Some(order.outstanding_at_time.clone());
        }
        merged.total_bill += &order.bill;
        merged.total_paid += &order.paid;
        merged.order_count += 1;

        for item in &order.lines {
            let slot = *index.entry(item.product_id).or_insert_with(|| {
                merged
                    .lines
                    .push(MergedProductLine::new(item.product_id, &item.product_name));
                merged.lines.len() - 1
            });
            let line = &mut merged.lines[slot];

            let signed_qty = if order.is_return {
                -item.quantity.clone()
            } else {
                item.quantity.clone()
            };
            line.net_amount += &signed_qty * &item.rate_at_purchase;
            line.net_quantity += &signed_qty;
            line.signed_quantities.push(signed_qty);
        }
    }

    merged
}
