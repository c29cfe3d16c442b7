use std::collections::HashMap;

use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::customer::{
    opening_balance_after_adjustment, CustomerPatch, CustomerView, DefaultProduct, NewCustomer,
};
use crate::domain::errors::DomainError;
use crate::domain::ledger::{LedgerEntry, Reconciliation};
use crate::domain::order::OrderView;
use crate::domain::payment::PaymentView;
use crate::domain::ports::CustomerRepository;
use crate::schema::{customer_default_products, customers, orders, payments};

use super::models::{
    CustomerChangeset, CustomerRow, DefaultProductRow, NewCustomerRow, OrderRow, PaymentRow,
};

fn load_default_products(
    conn: &mut PgConnection,
    customer_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<DefaultProduct>>, DomainError> {
    let rows = customer_default_products::table
        .filter(customer_default_products::customer_id.eq_any(customer_ids))
        .select(DefaultProductRow::as_select())
        .order((
            customer_default_products::customer_id,
            customer_default_products::position,
        ))
        .load::<DefaultProductRow>(conn)?;

    let mut by_customer: HashMap<Uuid, Vec<DefaultProduct>> = HashMap::new();
    for row in rows {
        by_customer
            .entry(row.customer_id)
            .or_default()
            .push(DefaultProduct {
                product_id: row.product_id,
                custom_price: row.custom_price,
            });
    }
    Ok(by_customer)
}

fn replace_default_products(
    conn: &mut PgConnection,
    customer_id: Uuid,
    default_products: &[DefaultProduct],
) -> Result<(), DomainError> {
    diesel::delete(
        customer_default_products::table
            .filter(customer_default_products::customer_id.eq(customer_id)),
    )
    .execute(conn)?;

    let rows: Vec<DefaultProductRow> = default_products
        .iter()
        .enumerate()
        .map(|(position, dp)| DefaultProductRow {
            customer_id,
            product_id: dp.product_id,
            position: position as i32,
            custom_price: dp.custom_price.clone(),
        })
        .collect();
    if rows.is_empty() {
        return Ok(());
    }
    diesel::insert_into(customer_default_products::table)
        .values(&rows)
        .execute(conn)?;
    Ok(())
}

fn to_view(row: CustomerRow, default_products: Vec<DefaultProduct>) -> CustomerView {
    CustomerView {
        id: row.id,
        name: row.name,
        phone: row.phone,
        address: row.address,
        notes: row.notes,
        opening_balance: row.opening_balance,
        outstanding_amount: row.outstanding_amount,
        default_products,
    }
}

fn find_customer(conn: &mut PgConnection, id: Uuid) -> Result<Option<CustomerView>, DomainError> {
    let row = customers::table
        .find(id)
        .select(CustomerRow::as_select())
        .first::<CustomerRow>(conn)
        .optional()?;
    let Some(row) = row else {
        return Ok(None);
    };
    let mut dps = load_default_products(conn, &[row.id])?;
    let default_products = dps.remove(&row.id).unwrap_or_default();
    Ok(Some(to_view(row, default_products)))
}

fn load_ledger(conn: &mut PgConnection, id: Uuid) -> Result<Vec<LedgerEntry>, DomainError> {
    let order_rows = orders::table
        .filter(orders::customer_id.eq(id))
        .select(OrderRow::as_select())
        .load::<OrderRow>(conn)?;
    let payment_rows = payments::table
        .filter(payments::customer_id.eq(id))
        .select(PaymentRow::as_select())
        .load::<PaymentRow>(conn)?;

    let mut entries: Vec<LedgerEntry> = order_rows
        .into_iter()
        .map(|row| LedgerEntry::from(&OrderView::from(row)))
        .collect();
    for row in payment_rows {
        entries.push(LedgerEntry::from(&PaymentView::try_from(row)?));
    }
    Ok(entries)
}

pub struct DieselCustomerRepository {
    pool: DbPool,
}

impl DieselCustomerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl CustomerRepository for DieselCustomerRepository {
    /// The opening amount becomes both the opening balance and the cached
    /// outstanding amount.
    fn create(&self, customer: NewCustomer) -> Result<CustomerView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let row = diesel::insert_into(customers::table)
                .values(&NewCustomerRow {
                    id: Uuid::new_v4(),
                    name: customer.name,
                    phone: customer.phone,
                    address: customer.address,
                    notes: customer.notes,
                    opening_balance: customer.outstanding_amount.clone(),
                    outstanding_amount: customer.outstanding_amount,
                })
                .returning(CustomerRow::as_returning())
                .get_result::<CustomerRow>(conn)?;
            replace_default_products(conn, row.id, &customer.default_products)?;
            Ok(to_view(row, customer.default_products))
        })
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<CustomerView>, DomainError> {
        let mut conn = self.pool.get()?;
        find_customer(&mut conn, id)
    }

    fn list(&self) -> Result<Vec<CustomerView>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = customers::table
            .select(CustomerRow::as_select())
            .order((customers::name.asc(), customers::id.asc()))
            .load::<CustomerRow>(&mut conn)?;
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut dps = load_default_products(&mut conn, &ids)?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let default_products = dps.remove(&row.id).unwrap_or_default();
                to_view(row, default_products)
            })
            .collect())
    }

    fn update(&self, id: Uuid, patch: CustomerPatch) -> Result<CustomerView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let current = customers::table
                .find(id)
                .select(CustomerRow::as_select())
                .for_update()
                .first::<CustomerRow>(conn)
                .optional()?
                .ok_or(DomainError::NotFound("Customer"))?;

            let opening_balance = patch.outstanding_amount.as_ref().map(|requested| {
                opening_balance_after_adjustment(
                    &current.opening_balance,
                    &current.outstanding_amount,
                    requested,
                )
            });

            diesel::update(customers::table.find(id))
                .set(&CustomerChangeset {
                    name: patch.name,
                    phone: patch.phone,
                    address: patch.address,
                    notes: patch.notes,
                    opening_balance,
                    outstanding_amount: patch.outstanding_amount,
                    updated_at: Some(Utc::now()),
                })
                .execute(conn)?;

            if let Some(dps) = &patch.default_products {
                replace_default_products(conn, id, dps)?;
            }

            find_customer(conn, id)?.ok_or(DomainError::NotFound("Customer"))
        })
    }

    fn ledger(&self, id: Uuid) -> Result<Vec<LedgerEntry>, DomainError> {
        let mut conn = self.pool.get()?;
        conn.transaction::<_, DomainError, _>(|conn| load_ledger(conn, id))
    }

    fn reconcile(&self, id: Uuid) -> Result<Reconciliation, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // Order and payment commits take the same lock.
            let current = customers::table
                .find(id)
                .select(CustomerRow::as_select())
                .for_update()
                .first::<CustomerRow>(conn)
                .optional()?
                .ok_or(DomainError::NotFound("Customer"))?;

            let entries = load_ledger(conn, id)?;
            let report = Reconciliation::check(
                id,
                &current.opening_balance,
                current.outstanding_amount,
                &entries,
            );
            if report.drifted {
                diesel::update(customers::table.find(id))
                    .set((
                        customers::outstanding_amount.eq(report.derived_balance.clone()),
                        customers::updated_at.eq(Utc::now()),
                    ))
                    .execute(conn)?;
            }
            Ok(report)
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use diesel::prelude::*;
    use uuid::Uuid;

    use super::DieselCustomerRepository;
    use crate::domain::customer::{CustomerPatch, DefaultProduct, NewCustomer};
    use crate::domain::errors::DomainError;
    use crate::domain::ledger::{fold_balance, LedgerEventKind};
    use crate::domain::order::{NewOrder, PricedLine};
    use crate::domain::payment::{NewPayment, PaymentMode};
    use crate::domain::ports::{
        CustomerRepository, OrderRepository, PaymentRepository, ProductRepository,
    };
    use crate::domain::product::{NewProduct, Unit};
    use crate::infrastructure::order_repo::DieselOrderRepository;
    use crate::infrastructure::payment_repo::DieselPaymentRepository;
    use crate::infrastructure::product_repo::DieselProductRepository;
    use crate::infrastructure::test_support::{dec, setup_db};
    use crate::schema::customers;

    fn ravi(outstanding: &str, default_products: Vec<DefaultProduct>) -> NewCustomer {
        NewCustomer {
            name: "Ravi".into(),
            phone: "98765 43210".into(),
            address: Some("12 Market Road".into()),
            notes: None,
            outstanding_amount: dec(outstanding),
            default_products,
        }
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn create_keeps_default_product_order() {
        let (_container, pool) = setup_db().await;
        let products = DieselProductRepository::new(pool.clone());
        let repo = DieselCustomerRepository::new(pool);

        let mut ids = Vec::new();
        for name in ["Milk", "Curd", "Ghee"] {
            let p = products
                .create(NewProduct {
                    name: name.into(),
                    unit: Unit::Pcs,
                    default_price: dec("10"),
                })
                .expect("create product failed");
            ids.push(p.id);
        }
        let dps: Vec<DefaultProduct> = ids
            .iter()
            .rev()
            .map(|id| DefaultProduct {
                product_id: *id,
                custom_price: None,
            })
            .collect();

        let created = repo.create(ravi("150", dps.clone())).expect("create failed");
        assert_eq!(created.opening_balance, dec("150"));

        let found = repo
            .find_by_id(created.id)
            .expect("find failed")
            .expect("customer should exist");
        assert_eq!(found.default_products, dps);
        assert_eq!(found.outstanding_amount, dec("150"));
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn unknown_default_product_is_a_conflict() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCustomerRepository::new(pool);

        let result = repo.create(ravi(
            "0",
            vec![DefaultProduct {
                product_id: Uuid::new_v4(),
                custom_price: None,
            }],
        ));
        assert!(matches!(result, Err(DomainError::Conflict(_))));
        assert!(repo.list().expect("list failed").is_empty());
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn manual_outstanding_edit_shifts_opening_balance() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCustomerRepository::new(pool);
        let created = repo.create(ravi("100", vec![])).expect("create failed");

        let updated = repo
            .update(
                created.id,
                CustomerPatch {
                    outstanding_amount: Some(dec("80")),
                    ..Default::default()
                },
            )
            .expect("update failed");

        assert_eq!(updated.outstanding_amount, dec("80"));
        assert_eq!(updated.opening_balance, dec("80"));
        assert_eq!(updated.name, "Ravi");
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn ledger_folds_to_cached_outstanding() {
        let (_container, pool) = setup_db().await;
        let products = DieselProductRepository::new(pool.clone());
        let customers = DieselCustomerRepository::new(pool.clone());
        let orders = DieselOrderRepository::new(pool.clone());
        let payments = DieselPaymentRepository::new(pool);

        let milk = products
            .create(NewProduct {
                name: "Milk".into(),
                unit: Unit::Litre,
                default_price: dec("50"),
            })
            .expect("create product failed");
        let customer = customers.create(ravi("100", vec![])).expect("create failed");
        let at = Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap();

        orders
            .create(NewOrder {
                customer_id: customer.id,
                date: at,
                billed_by: None,
                is_return: false,
                lines: vec![PricedLine {
                    product_id: milk.id,
                    rate_at_purchase: dec("50"),
                    quantity: dec("3"),
                }],
                paid: dec("20"),
            })
            .expect("create order failed");
        payments
            .create(NewPayment {
                customer_id: customer.id,
                date: at,
                amount: dec("30"),
                mode_of_payment: PaymentMode::Cash,
                paid_to: None,
                notes: None,
            })
            .expect("create payment failed");

        let entries = customers.ledger(customer.id).expect("ledger failed");
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().any(|e| e.kind == LedgerEventKind::Payment));

        let cached = customers
            .find_by_id(customer.id)
            .expect("find failed")
            .expect("customer should exist")
            .outstanding_amount;
        // 100 + (150 - 20) - 30
        assert_eq!(cached, dec("200"));
        assert_eq!(fold_balance(&customer.opening_balance, &entries), cached);
    }

    fn milk_order(customer_id: Uuid, milk: Uuid, quantity: &str) -> NewOrder {
        NewOrder {
            customer_id,
            date: Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap(),
            billed_by: None,
            is_return: false,
            lines: vec![PricedLine {
                product_id: milk,
                rate_at_purchase: dec("50"),
                quantity: dec(quantity),
            }],
            paid: dec("0"),
        }
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn reconcile_rewrites_drifted_cache() {
        let (_container, pool) = setup_db().await;
        let products = DieselProductRepository::new(pool.clone());
        let customers = DieselCustomerRepository::new(pool.clone());
        let orders = DieselOrderRepository::new(pool.clone());

        let milk = products
            .create(NewProduct {
                name: "Milk".into(),
                unit: Unit::Litre,
                default_price: dec("50"),
            })
            .expect("create product failed");
        let customer = customers.create(ravi("100", vec![])).expect("create failed");
        orders
            .create(milk_order(customer.id, milk.id, "2"))
            .expect("create order failed");

        {
            let mut conn = pool.get().expect("connection");
            diesel::update(customers::table.find(customer.id))
                .set(customers::outstanding_amount.eq(dec("0")))
                .execute(&mut conn)
                .expect("update failed");
        }

        let report = customers.reconcile(customer.id).expect("reconcile failed");
        assert!(report.drifted);
        assert_eq!(report.cached_balance, dec("0"));
        assert_eq!(report.derived_balance, dec("200"));

        let again = customers.reconcile(customer.id).expect("reconcile failed");
        assert!(!again.drifted);
        assert_eq!(again.cached_balance, dec("200"));
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn reconcile_never_loses_concurrent_orders() {
        let (_container, pool) = setup_db().await;
        let products = DieselProductRepository::new(pool.clone());
        let customers = DieselCustomerRepository::new(pool.clone());

        let milk = products
            .create(NewProduct {
                name: "Milk".into(),
                unit: Unit::Litre,
                default_price: dec("50"),
            })
            .expect("create product failed");
        let customer = customers.create(ravi("100", vec![])).expect("create failed");

        std::thread::scope(|scope| {
            let writer_pool = pool.clone();
            scope.spawn(move || {
                let orders = DieselOrderRepository::new(writer_pool);
                for _ in 0..20 {
                    orders
                        .create(milk_order(customer.id, milk.id, "1"))
                        .expect("create order failed");
                }
            });
            let reconciler_pool = pool.clone();
            scope.spawn(move || {
                let customers = DieselCustomerRepository::new(reconciler_pool);
                for _ in 0..20 {
                    let report = customers.reconcile(customer.id).expect("reconcile failed");
                    assert!(!report.drifted, "reconcile saw a half-applied order");
                }
            });
        });

        let report = customers.reconcile(customer.id).expect("reconcile failed");
        assert!(!report.drifted);
        // 100 + 20 × 50
        assert_eq!(report.cached_balance, dec("1100"));
    }
}
