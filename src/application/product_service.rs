use bigdecimal::BigDecimal;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::pricing::{PriceIncrement, PropagationOutcome};
use crate::domain::ports::ProductRepository;
use crate::domain::product::{NewProduct, ProductPatch, ProductView};

pub struct ProductService<P> {
    products: P,
}

impl<P: ProductRepository> ProductService<P> {
    pub fn new(products: P) -> Self {
        Self { products }
    }

    pub fn create_product(&self, product: NewProduct) -> Result<ProductView, DomainError> {
        product.validate()?;
        self.products.create(product)
    }

    pub fn list_products(&self) -> Result<Vec<ProductView>, DomainError> {
        self.products.list()
    }

    pub fn get_product(&self, id: Uuid) -> Result<Option<ProductView>, DomainError> {
        self.products.find_by_id(id)
    }

    pub fn update_product(&self, id: Uuid, patch: ProductPatch) -> Result<ProductView, DomainError> {
        patch.validate()?;
        self.products.update(id, patch)
    }

    pub fn delete_product(&self, id: Uuid) -> Result<(), DomainError> {
        self.products.delete(id)?;
        log::info!("product {id} deleted");
        Ok(())
    }

    /// Moves the product's default price and every stored customer override
    /// by `delta`. Re-sending the same `propagation_id` is a no-op.
    pub fn increment_price(
        &self,
        product_id: Uuid,
        delta: BigDecimal,
        propagation_id: Option<Uuid>,
    ) -> Result<PropagationOutcome, DomainError> {
        let increment = PriceIncrement {
            product_id,
            delta,
            propagation_id: propagation_id.unwrap_or_else(Uuid::new_v4),
        };
        let outcome = self.products.apply_price_increment(&increment)?;
        if outcome.already_applied {
            log::info!(
                "price propagation {} for product {} was already applied",
                outcome.propagation_id,
                product_id
            );
        } else {
            log::info!(
                "product {} price moved by {} to {}, {} customer overrides updated",
                product_id,
                increment.delta,
                outcome.new_default_price,
                outcome.overrides_updated
            );
        }
        Ok(outcome)
    }
}
