//! Bill reconciliation: merging a customer's orders into one statement and
//! carrying the balance forward across sales, returns and payments.

pub mod balance;
pub mod merge;
pub mod share;
pub mod summary;

pub use balance::BalanceSummary;
pub use merge::{merge_orders, processing_order, MergedBill, MergedProductLine};
