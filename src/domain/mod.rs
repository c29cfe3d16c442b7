pub mod customer;
pub mod errors;
pub mod inventory;
pub mod ledger;
pub mod money;
pub mod order;
pub mod payment;
pub mod period;
pub mod pricing;
pub mod ports;
pub mod product;
