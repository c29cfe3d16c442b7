use std::collections::HashSet;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::money::round2;
use super::period::DateRange;

/// A requested order line. A missing rate is resolved from the customer's
/// effective price for the product.
#[derive(Debug, Clone)]
pub struct OrderLineInput {
    pub product_id: Uuid,
    pub rate_at_purchase: Option<BigDecimal>,
    pub quantity: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct OrderInput {
    pub customer_id: Uuid,
    pub date: Option<DateTime<Utc>>,
    pub billed_by: Option<String>,
    pub is_return: bool,
    pub lines: Vec<OrderLineInput>,
    pub paid: BigDecimal,
}

impl OrderInput {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.lines.is_empty() {
            return Err(DomainError::invalid("an order needs at least one product"));
        }
        if self.paid < BigDecimal::zero() {
            return Err(DomainError::invalid("paid amount must not be negative"));
        }
        let mut seen = HashSet::new();
        for line in &self.lines {
            if !seen.insert(line.product_id) {
                return Err(DomainError::invalid(format!(
                    "product {} appears twice in the order",
                    line.product_id
                )));
            }
            if line.quantity <= BigDecimal::zero() {
                return Err(DomainError::invalid("quantity must be greater than zero"));
            }
            if matches!(&line.rate_at_purchase, Some(r) if *r < BigDecimal::zero()) {
                return Err(DomainError::invalid("rate must not be negative"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub rate_at_purchase: BigDecimal,
    pub quantity: BigDecimal,
}

/// An order with every rate resolved, ready to be committed.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: Uuid,
    pub date: DateTime<Utc>,
    pub billed_by: Option<String>,
    pub is_return: bool,
    pub lines: Vec<PricedLine>,
    pub paid: BigDecimal,
}

impl NewOrder {
    pub fn bill(&self) -> BigDecimal {
        compute_bill(&self.lines)
    }

    /// Change to the customer's outstanding amount once this order is
    /// committed.
    pub fn balance_effect(&self) -> BigDecimal {
        balance_effect(self.is_return, &self.bill(), &self.paid)
    }
}

/// `round2(Σ rate × quantity)`.
pub fn compute_bill(lines: &[PricedLine]) -> BigDecimal {
    let sum = lines
        .iter()
        .fold(BigDecimal::zero(), |acc, l| acc + &l.rate_at_purchase * &l.quantity);
    round2(&sum)
}

pub fn balance_effect(is_return: bool, bill: &BigDecimal, paid: &BigDecimal) -> BigDecimal {
    if is_return {
        -(bill + paid)
    } else {
        bill - paid
    }
}

#[derive(Debug, Clone)]
pub struct OrderLineView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub rate_at_purchase: BigDecimal,
    pub quantity: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub date: DateTime<Utc>,
    pub billed_by: Option<String>,
    pub is_return: bool,
    pub bill: BigDecimal,
    pub paid: BigDecimal,
    /// Customer balance immediately before this order was committed.
    pub outstanding_at_time: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<OrderLineView>,
}

impl OrderView {
    pub fn signed_bill(&self) -> BigDecimal {
        if self.is_return {
            -self.bill.clone()
        } else {
            self.bill.clone()
        }
    }

    pub fn balance_effect(&self) -> BigDecimal {
        balance_effect(self.is_return, &self.bill, &self.paid)
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub customer_id: Option<Uuid>,
    pub billed_by: Option<String>,
    pub is_return: Option<bool>,
    pub period: Option<DateRange>,
}

#[derive(Debug, Clone)]
pub struct ListResult {
    pub items: Vec<OrderView>,
    pub total: i64,
}

/// Rows to skip for a 1-based `page`. Saturates instead of overflowing on
/// absurd page numbers, which then simply return nothing.
pub fn page_offset(page: i64, limit: i64) -> i64 {
    page.max(1).saturating_sub(1).saturating_mul(limit.max(0))
}
