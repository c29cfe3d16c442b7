pub mod bill_service;
pub mod customer_service;
pub mod dashboard_service;
pub mod inventory_service;
pub mod order_service;
pub mod payment_service;
pub mod product_service;

#[cfg(test)]
pub(crate) mod memory;
