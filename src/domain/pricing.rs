//! Moving a product's price for everyone at once.
//!
//! The increment is added to the product's default price and to every
//! customer override that is explicitly stored for that product. Customers
//! without an override read the default and need no update. Historical
//! order lines keep their `rate_at_purchase`.

use bigdecimal::{BigDecimal, Zero};
use uuid::Uuid;

use super::customer::CustomerView;
use super::errors::DomainError;
use super::product::ProductView;

#[derive(Debug, Clone)]
pub struct PriceIncrement {
    pub product_id: Uuid,
    /// May be negative.
    pub delta: BigDecimal,
    /// Caller-chosen key; a propagation already recorded under this id is
    /// not applied again.
    pub propagation_id: Uuid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredOverride {
    pub customer_id: Uuid,
    pub custom_price: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricePlan {
    pub product_id: Uuid,
    pub new_default_price: BigDecimal,
    pub overrides: Vec<StoredOverride>,
}

#[derive(Debug, Clone)]
pub struct PropagationOutcome {
    pub propagation_id: Uuid,
    pub product_id: Uuid,
    pub new_default_price: BigDecimal,
    pub overrides_updated: i32,
    pub already_applied: bool,
}

/// Computes every new price up front so the whole batch is rejected before
/// any write when one of them would go negative.
pub fn plan(
    product: &ProductView,
    overrides: &[StoredOverride],
    delta: &BigDecimal,
) -> Result<PricePlan, DomainError> {
    let new_default_price = &product.default_price + delta;
    if new_default_price < BigDecimal::zero() {
        return Err(DomainError::invalid(format!(
            "increment {delta} would make the default price of {} negative",
            product.name
        )));
    }

    let overrides = overrides
        .iter()
        .map(|o| {
            let new_price = &o.custom_price + delta;
            if new_price < BigDecimal::zero() {
                return Err(DomainError::invalid(format!(
                    "increment {delta} would make the custom price of customer {} negative",
                    o.customer_id
                )));
            }
            Ok(StoredOverride {
                customer_id: o.customer_id,
                custom_price: new_price,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PricePlan {
        product_id: product.id,
        new_default_price,
        overrides,
    })
}

/// Overrides explicitly stored for `product_id` across `customers`.
pub fn stored_overrides(product_id: Uuid, customers: &[CustomerView]) -> Vec<StoredOverride> {
    customers
        .iter()
        .filter_map(|c| {
            c.default_product(product_id)
                .and_then(|dp| dp.custom_price.clone())
                .map(|custom_price| StoredOverride {
                    customer_id: c.id,
                    custom_price,
                })
        })
        .collect()
}

impl PricePlan {
    /// Applies the plan to in-memory records.
    pub fn apply(&self, product: &mut ProductView, customers: &mut [CustomerView]) {
        product.default_price = self.new_default_price.clone();
        for update in &self.overrides {
            let entry = customers
                .iter_mut()
                .filter(|c| c.id == update.customer_id)
                .flat_map(|c| c.default_products.iter_mut())
                .find(|dp| dp.product_id == self.product_id);
            if let Some(dp) = entry {
                dp.custom_price = Some(update.custom_price.clone());
            }
        }
    }
}
