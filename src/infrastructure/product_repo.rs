use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::ProductRepository;
use crate::domain::pricing::{plan, PriceIncrement, PropagationOutcome, StoredOverride};
use crate::domain::product::{NewProduct, ProductPatch, ProductView};
use crate::schema::{customer_default_products, price_propagations, products};

use super::models::{NewProductRow, PricePropagationRow, ProductChangeset, ProductRow};

impl TryFrom<ProductRow> for ProductView {
    type Error = DomainError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(ProductView {
            id: row.id,
            unit: row
                .unit
                .parse()
                .map_err(|e: DomainError| DomainError::Internal(e.to_string()))?,
            name: row.name,
            default_price: row.default_price,
        })
    }
}

pub struct DieselProductRepository {
    pool: DbPool,
}

impl DieselProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl ProductRepository for DieselProductRepository {
    fn create(&self, product: NewProduct) -> Result<ProductView, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(products::table)
            .values(&NewProductRow {
                id: Uuid::new_v4(),
                name: product.name,
                unit: product.unit.as_str().to_string(),
                default_price: product.default_price,
            })
            .returning(ProductRow::as_returning())
            .get_result::<ProductRow>(&mut conn)?;
        row.try_into()
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<ProductView>, DomainError> {
        let mut conn = self.pool.get()?;
        products::table
            .find(id)
            .select(ProductRow::as_select())
            .first::<ProductRow>(&mut conn)
            .optional()?
            .map(ProductView::try_from)
            .transpose()
    }

    fn list(&self) -> Result<Vec<ProductView>, DomainError> {
        let mut conn = self.pool.get()?;
        products::table
            .select(ProductRow::as_select())
            .order((products::name.asc(), products::id.asc()))
            .load::<ProductRow>(&mut conn)?
            .into_iter()
            .map(ProductView::try_from)
            .collect()
    }

    fn update(&self, id: Uuid, patch: ProductPatch) -> Result<ProductView, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::update(products::table.find(id))
            .set(&ProductChangeset {
                name: patch.name,
                unit: patch.unit.map(|u| u.as_str().to_string()),
                default_price: patch.default_price,
                updated_at: Some(Utc::now()),
            })
            .returning(ProductRow::as_returning())
            .get_result::<ProductRow>(&mut conn)
            .optional()?
            .ok_or(DomainError::NotFound("Product"))?;
        row.try_into()
    }

    /// Fails with a conflict while any order line or inventory item still
    /// refers to the product. Default-product links are dropped with it.
    fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(products::table.find(id)).execute(&mut conn)?;
        if deleted == 0 {
            return Err(DomainError::NotFound("Product"));
        }
        Ok(())
    }

    fn apply_price_increment(
        &self,
        increment: &PriceIncrement,
    ) -> Result<PropagationOutcome, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let done = price_propagations::table
                .find(increment.propagation_id)
                .select(PricePropagationRow::as_select())
                .first::<PricePropagationRow>(conn)
                .optional()?;
            if let Some(done) = done {
                if done.product_id != increment.product_id {
                    return Err(DomainError::Conflict(format!(
                        "propagation {} was already used for product {}",
                        done.id, done.product_id
                    )));
                }
                return Ok(PropagationOutcome {
                    propagation_id: done.id,
                    product_id: done.product_id,
                    new_default_price: done.new_default_price,
                    overrides_updated: done.overrides_updated,
                    already_applied: true,
                });
            }

            let product: ProductView = products::table
                .find(increment.product_id)
                .select(ProductRow::as_select())
                .for_update()
                .first::<ProductRow>(conn)
                .optional()?
                .ok_or(DomainError::NotFound("Product"))?
                .try_into()?;

            let overrides: Vec<StoredOverride> = customer_default_products::table
                .filter(customer_default_products::product_id.eq(product.id))
                .select((
                    customer_default_products::customer_id,
                    customer_default_products::custom_price,
                ))
                .for_update()
                .load::<(Uuid, Option<bigdecimal::BigDecimal>)>(conn)?
                .into_iter()
                .filter_map(|(customer_id, price)| {
                    price.map(|custom_price| StoredOverride {
                        customer_id,
                        custom_price,
                    })
                })
                .collect();

            // Rejects the batch before any row is touched.
            let price_plan = plan(&product, &overrides, &increment.delta)?;

            diesel::update(products::table.find(product.id))
                .set((
                    products::default_price.eq(price_plan.new_default_price.clone()),
                    products::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;

            for o in &price_plan.overrides {
                diesel::update(
                    customer_default_products::table.find((o.customer_id, product.id)),
                )
                .set(customer_default_products::custom_price.eq(Some(o.custom_price.clone())))
                .execute(conn)?;
            }

            let overrides_updated = price_plan.overrides.len() as i32;
            diesel::insert_into(price_propagations::table)
                .values(&PricePropagationRow {
                    id: increment.propagation_id,
                    product_id: product.id,
                    price_increment: increment.delta.clone(),
                    new_default_price: price_plan.new_default_price.clone(),
                    overrides_updated,
                })
                .execute(conn)?;

            Ok(PropagationOutcome {
                propagation_id: increment.propagation_id,
                product_id: product.id,
                new_default_price: price_plan.new_default_price,
                overrides_updated,
                already_applied: false,
            })
        })
    }
}
