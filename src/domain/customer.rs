use std::collections::HashSet;

use bigdecimal::{BigDecimal, Zero};
use uuid::Uuid;

use super::errors::DomainError;
use super::product::ProductView;

/// A product the customer habitually buys. `custom_price` is stored only
/// when it overrides the product's default price.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultProduct {
    pub product_id: Uuid,
    pub custom_price: Option<BigDecimal>,
}

#[derive(Debug, Clone)]
pub struct CustomerView {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub opening_balance: BigDecimal,
    /// Positive when the customer owes the vendor.
    pub outstanding_amount: BigDecimal,
    pub default_products: Vec<DefaultProduct>,
}

impl CustomerView {
    pub fn default_product(&self, product_id: Uuid) -> Option<&DefaultProduct> {
        self.default_products
            .iter()
            .find(|dp| dp.product_id == product_id)
    }

    /// The rate this customer is charged for `product` unless the order says
    /// otherwise.
    pub fn effective_price(&self, product: &ProductView) -> BigDecimal {
        self.default_product(product.id)
            .and_then(|dp| dp.custom_price.clone())
            .unwrap_or_else(|| product.default_price.clone())
    }

    pub fn phone_digits(&self) -> String {
        self.phone.chars().filter(char::is_ascii_digit).collect()
    }
}

#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub phone: String,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub outstanding_amount: BigDecimal,
    pub default_products: Vec<DefaultProduct>,
}

impl NewCustomer {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::invalid("customer name is required"));
        }
        if self.phone.trim().is_empty() {
            return Err(DomainError::invalid("customer phone is required"));
        }
        validate_default_products(&self.default_products)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CustomerPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    /// Setting the balance by hand is recorded as an opening balance
    /// adjustment, see [`opening_balance_after_adjustment`].
    pub outstanding_amount: Option<BigDecimal>,
    pub default_products: Option<Vec<DefaultProduct>>,
}

impl CustomerPatch {
    pub fn validate(&self) -> Result<(), DomainError> {
        if matches!(&self.name, Some(n) if n.trim().is_empty()) {
            return Err(DomainError::invalid("customer name cannot be blank"));
        }
        if matches!(&self.phone, Some(p) if p.trim().is_empty()) {
            return Err(DomainError::invalid("customer phone cannot be blank"));
        }
        match &self.default_products {
            Some(dps) => validate_default_products(dps),
            None => Ok(()),
        }
    }
}

/// Shifts the opening balance so that `opening + Σ events` lands on the
/// manually entered outstanding amount.
pub fn opening_balance_after_adjustment(
    opening: &BigDecimal,
    cached_outstanding: &BigDecimal,
    requested_outstanding: &BigDecimal,
) -> BigDecimal {
    opening + (requested_outstanding - cached_outstanding)
}

fn validate_default_products(dps: &[DefaultProduct]) -> Result<(), DomainError> {
    let mut seen = HashSet::new();
    for dp in dps {
        if !seen.insert(dp.product_id) {
            return Err(DomainError::invalid(format!(
                "product {} listed twice in default products",
                dp.product_id
            )));
        }
        if matches!(&dp.custom_price, Some(p) if *p < BigDecimal::zero()) {
            return Err(DomainError::invalid("custom price must not be negative"));
        }
    }
    Ok(())
}
