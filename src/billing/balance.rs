use bigdecimal::BigDecimal;

use super::merge::MergedBill;
use crate::domain::money::round2;
use crate::domain::order::NewOrder;

/// `total = old_balance + net_bill`, `new_balance = total - paid`.
///
/// `net_bill` is already return-adjusted (Σ merged net amounts, or the
/// signed bill of a single order). `gross_bill` is the unsigned Σ of order
/// bills and is informational only.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceSummary {
    pub old_balance: BigDecimal,
    pub gross_bill: BigDecimal,
    pub net_bill: BigDecimal,
    pub paid: BigDecimal,
    pub total: BigDecimal,
    pub new_balance: BigDecimal,
}

impl BalanceSummary {
    pub fn compute(
        old_balance: BigDecimal,
        gross_bill: BigDecimal,
        net_bill: BigDecimal,
        paid: BigDecimal,
    ) -> Self {
        let total = &old_balance + &net_bill;
        let new_balance = &total - &paid;
        Self {
            old_balance,
            gross_bill,
            net_bill,
            paid,
            total,
            new_balance,
        }
    }

    /// `None` when no orders were merged; there is nothing to bill.
    pub fn from_merged(merged: &MergedBill) -> Option<Self> {
        let old_balance = merged.old_balance.clone()?;
        Some(Self::compute(
            old_balance,
            merged.total_bill.clone(),
            merged.net_amount(),
            merged.total_paid.clone(),
        ))
    }

    /// Summary for an order that has not been committed yet.
    pub fn for_new_order(old_balance: BigDecimal, order: &NewOrder) -> Self {
        let bill = order.bill();
        let net_bill = if order.is_return { -bill.clone() } else { bill.clone() };
        Self::compute(old_balance, bill, net_bill, order.paid.clone())
    }

    pub fn rounded(&self) -> Self {
        Self {
            old_balance: round2(&self.old_balance),
            gross_bill: round2(&self.gross_bill),
            net_bill: round2(&self.net_bill),
            paid: round2(&self.paid),
            total: round2(&self.total),
            new_balance: round2(&self.new_balance),
        }
    }
}
