use std::collections::HashMap;

use chrono::NaiveDate;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::inventory::{InventoryItemView, InventoryView, NewInventory};
use crate::domain::ports::InventoryRepository;
use crate::schema::{inventory_entries, inventory_items, products};

use super::models::{InventoryEntryRow, InventoryItemRow};

pub struct DieselInventoryRepository {
    pool: DbPool,
}

impl DieselInventoryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn load_items(
    conn: &mut PgConnection,
    entry_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<InventoryItemView>>, DomainError> {
    let rows = inventory_items::table
        .inner_join(products::table)
        .filter(inventory_items::entry_id.eq_any(entry_ids))
        .order((inventory_items::entry_id, inventory_items::position))
        .select((InventoryItemRow::as_select(), products::name))
        .load::<(InventoryItemRow, String)>(conn)?;

    let mut by_entry: HashMap<Uuid, Vec<InventoryItemView>> = HashMap::new();
    for (item, product_name) in rows {
        by_entry.entry(item.entry_id).or_default().push(InventoryItemView {
            product_id: item.product_id,
            product_name,
            quantity: item.quantity,
        });
    }
    Ok(by_entry)
}

impl InventoryRepository for DieselInventoryRepository {
    fn add(&self, inventory: NewInventory) -> Result<InventoryView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let entry = InventoryEntryRow {
                id: Uuid::new_v4(),
                date: inventory.date,
            };
            diesel::insert_into(inventory_entries::table)
                .values(&entry)
                .execute(conn)?;

            let items: Vec<InventoryItemRow> = inventory
                .items
                .iter()
                .enumerate()
                .map(|(position, item)| InventoryItemRow {
                    id: Uuid::new_v4(),
                    entry_id: entry.id,
                    product_id: item.product_id,
                    position: position as i32,
                    quantity: item.quantity.clone(),
                })
                .collect();
            diesel::insert_into(inventory_items::table)
                .values(&items)
                .execute(conn)?;

            let mut by_entry = load_items(conn, &[entry.id])?;
            Ok(InventoryView {
                id: entry.id,
                date: entry.date,
                items: by_entry.remove(&entry.id).unwrap_or_default(),
            })
        })
    }

    fn list_for_date(&self, date: NaiveDate) -> Result<Vec<InventoryView>, DomainError> {
        let mut conn = self.pool.get()?;

        let entries = inventory_entries::table
            .filter(inventory_entries::date.eq(date))
            .select(InventoryEntryRow::as_select())
            .order((inventory_entries::created_at, inventory_entries::id))
            .load::<InventoryEntryRow>(&mut conn)?;
        let ids: Vec<Uuid> = entries.iter().map(|e| e.id).collect();
        let mut by_entry = load_items(&mut conn, &ids)?;

        Ok(entries
            .into_iter()
            .map(|entry| InventoryView {
                items: by_entry.remove(&entry.id).unwrap_or_default(),
                id: entry.id,
                date: entry.date,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use super::DieselInventoryRepository;
    use crate::domain::errors::DomainError;
    use crate::domain::inventory::{InventoryItemInput, NewInventory};
    use crate::domain::ports::{InventoryRepository, ProductRepository};
    use crate::domain::product::{NewProduct, Unit};
    use crate::infrastructure::product_repo::DieselProductRepository;
    use crate::infrastructure::test_support::{dec, setup_db};

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn entries_are_listed_for_their_day_only() {
        let (_container, pool) = setup_db().await;
        let products = DieselProductRepository::new(pool.clone());
        let repo = DieselInventoryRepository::new(pool);
        let milk = products
            .create(NewProduct {
                name: "Milk".into(),
                unit: Unit::Litre,
                default_price: dec("50"),
            })
            .expect("create product failed");
        let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

        for (date, qty) in [(day, "40"), (day, "5"), (day.succ_opt().unwrap(), "7")] {
            repo.add(NewInventory {
                date,
                items: vec![InventoryItemInput {
                    product_id: milk.id,
                    quantity: dec(qty),
                }],
            })
            .expect("add failed");
        }

        let listed = repo.list_for_date(day).expect("list failed");
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].items[0].product_name, "Milk");
        assert_eq!(listed[0].items[0].quantity, dec("40"));
        assert_eq!(listed[1].items[0].quantity, dec("5"));
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn unknown_product_is_a_conflict() {
        let (_container, pool) = setup_db().await;
        let repo = DieselInventoryRepository::new(pool);
        let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

        let result = repo.add(NewInventory {
            date: day,
            items: vec![InventoryItemInput {
                product_id: Uuid::new_v4(),
                quantity: dec("1"),
            }],
        });
        assert!(matches!(result, Err(DomainError::Conflict(_))));
        assert!(repo.list_for_date(day).expect("list failed").is_empty());
    }
}
