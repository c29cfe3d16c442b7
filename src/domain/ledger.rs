//! Orders and payments seen as signed events against a customer's balance.
//!
//! The customer's stored `outstanding_amount` is a cache of
//! `opening_balance + Σ effect` over every event below.

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::order::{balance_effect, OrderView};
use super::payment::PaymentView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerEventKind {
    Sale,
    Return,
    Payment,
}

impl LedgerEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerEventKind::Sale => "sale",
            LedgerEventKind::Return => "return",
            LedgerEventKind::Payment => "payment",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub kind: LedgerEventKind,
    pub date: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,
    /// Order bill or payment amount, unsigned.
    pub amount: BigDecimal,
    /// Settled at order time; always zero for payments.
    pub paid: BigDecimal,
}

impl LedgerEntry {
    /// Position of the event in the customer's history.
    pub fn sort_key(&self) -> (DateTime<Utc>, DateTime<Utc>, Uuid) {
        (self.date, self.recorded_at, self.id)
    }

    pub fn effect(&self) -> BigDecimal {
        match self.kind {
            LedgerEventKind::Sale => balance_effect(false, &self.amount, &self.paid),
            LedgerEventKind::Return => balance_effect(true, &self.amount, &self.paid),
            LedgerEventKind::Payment => -self.amount.clone(),
        }
    }
}

impl From<&OrderView> for LedgerEntry {
    fn from(order: &OrderView) -> Self {
        LedgerEntry {
            id: order.id,
            kind: if order.is_return {
                LedgerEventKind::Return
            } else {
                LedgerEventKind::Sale
            },
            date: order.date,
            recorded_at: order.created_at,
            amount: order.bill.clone(),
            paid: order.paid.clone(),
        }
    }
}

impl From<&PaymentView> for LedgerEntry {
    fn from(payment: &PaymentView) -> Self {
        LedgerEntry {
            id: payment.id,
            kind: LedgerEventKind::Payment,
            date: payment.date,
            recorded_at: payment.created_at,
            amount: payment.amount.clone(),
            paid: BigDecimal::zero(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatementLine {
    pub entry: LedgerEntry,
    pub balance_after: BigDecimal,
}

pub fn fold_balance<'a>(
    opening: &BigDecimal,
    entries: impl IntoIterator<Item = &'a LedgerEntry>,
) -> BigDecimal {
    entries
        .into_iter()
        .fold(opening.clone(), |acc, e| acc + e.effect())
}

/// Sorts by `(date, recorded_at, id)` and pairs each event with the balance
/// right after it.
pub fn running_balances(opening: &BigDecimal, mut entries: Vec<LedgerEntry>) -> Vec<StatementLine> {
    entries.sort_by_key(LedgerEntry::sort_key);
    let mut balance = opening.clone();
    entries
        .into_iter()
        .map(|entry| {
            balance += entry.effect();
            StatementLine {
                entry,
                balance_after: balance.clone(),
            }
        })
        .collect()
}

/// Balance immediately before `event`: the opening balance plus every entry
/// that sorts ahead of it. Entries recorded later but dated earlier count.
pub fn balance_before(
    opening: &BigDecimal,
    entries: &[LedgerEntry],
    event: &LedgerEntry,
) -> BigDecimal {
    let key = event.sort_key();
    fold_balance(opening, entries.iter().filter(|e| e.sort_key() < key))
}

/// Outcome of re-deriving a customer's cached balance from the ledger.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub customer_id: Uuid,
    pub cached_balance: BigDecimal,
    pub derived_balance: BigDecimal,
    pub drifted: bool,
}

impl Reconciliation {
    pub fn check(
        customer_id: Uuid,
        opening: &BigDecimal,
        cached_balance: BigDecimal,
        entries: &[LedgerEntry],
    ) -> Self {
        let derived_balance = fold_balance(opening, entries);
        Reconciliation {
            customer_id,
            drifted: derived_balance != cached_balance,
            cached_balance,
            derived_balance,
        }
    }
}
