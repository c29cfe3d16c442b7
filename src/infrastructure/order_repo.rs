use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::Utc;
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    page_offset, ListResult, NewOrder, OrderFilter, OrderLineView, OrderView,
};
use crate::domain::ports::OrderRepository;
use crate::schema::{customers, order_lines, orders, products};

use super::models::{NewOrderLineRow, NewOrderRow, OrderLineRow, OrderRow};

impl From<OrderRow> for OrderView {
    fn from(row: OrderRow) -> Self {
        OrderView {
            id: row.id,
            customer_id: row.customer_id,
            date: row.date,
            billed_by: row.billed_by,
            is_return: row.is_return,
            bill: row.bill,
            paid: row.paid,
            outstanding_at_time: row.outstanding_at_time,
            created_at: row.created_at,
            lines: vec![],
        }
    }
}

fn filtered(filter: &OrderFilter) -> orders::BoxedQuery<'static, Pg> {
    let mut query = orders::table.into_boxed();
    if let Some(customer_id) = filter.customer_id {
        query = query.filter(orders::customer_id.eq(customer_id));
    }
    if let Some(billed_by) = &filter.billed_by {
        query = query.filter(orders::billed_by.eq(billed_by.clone()));
    }
    if let Some(is_return) = filter.is_return {
        query = query.filter(orders::is_return.eq(is_return));
    }
    if let Some(period) = filter.period {
        let (from, until) = period.bounds();
        if let Some(from) = from {
            query = query.filter(orders::date.ge(from));
        }
        if let Some(until) = until {
            query = query.filter(orders::date.lt(until));
        }
    }
    query
}

/// Attaches lines, in entry order and with product names, to each order.
fn with_lines(conn: &mut PgConnection, rows: Vec<OrderRow>) -> Result<Vec<OrderView>, DomainError> {
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let lines = order_lines::table
        .inner_join(products::table)
        .filter(order_lines::order_id.eq_any(&ids))
        .order((order_lines::order_id, order_lines::position))
        .select((OrderLineRow::as_select(), products::name))
        .load::<(OrderLineRow, String)>(conn)?;

    let mut by_order: HashMap<Uuid, Vec<OrderLineView>> = HashMap::new();
    for (line, product_name) in lines {
        by_order.entry(line.order_id).or_default().push(OrderLineView {
            id: line.id,
            product_id: line.product_id,
            product_name,
            rate_at_purchase: line.rate_at_purchase,
            quantity: line.quantity,
        });
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let lines = by_order.remove(&row.id).unwrap_or_default();
            OrderView {
                lines,
                ..OrderView::from(row)
            }
        })
        .collect())
}

/// Locks the customer row and returns its cached outstanding amount.
fn lock_outstanding(conn: &mut PgConnection, customer_id: Uuid) -> Result<BigDecimal, DomainError> {
    customers::table
        .find(customer_id)
        .select(customers::outstanding_amount)
        .for_update()
        .first::<BigDecimal>(conn)
        .optional()?
        .ok_or(DomainError::NotFound("Customer"))
}

fn store_outstanding(
    conn: &mut PgConnection,
    customer_id: Uuid,
    amount: BigDecimal,
) -> Result<(), DomainError> {
    diesel::update(customers::table.find(customer_id))
        .set((
            customers::outstanding_amount.eq(amount),
            customers::updated_at.eq(Utc::now()),
        ))
        .execute(conn)?;
    Ok(())
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl OrderRepository for DieselOrderRepository {
    fn create(&self, order: NewOrder) -> Result<OrderView, DomainError> {
        let mut conn = self.pool.get()?;
        let bill = order.bill();
        let effect = order.balance_effect();

        conn.transaction::<_, DomainError, _>(|conn| {
            // 1. Snapshot the balance the order is applied on top of
            let outstanding_at_time = lock_outstanding(conn, order.customer_id)?;

            // 2. Insert the order
            let order_id = Uuid::new_v4();
            let row = diesel::insert_into(orders::table)
                .values(&NewOrderRow {
                    id: order_id,
                    customer_id: order.customer_id,
                    date: order.date,
                    billed_by: order.billed_by.clone(),
                    is_return: order.is_return,
                    bill,
                    paid: order.paid.clone(),
                    outstanding_at_time: outstanding_at_time.clone(),
                })
                .returning(OrderRow::as_returning())
                .get_result::<OrderRow>(conn)?;

            // 3. Insert order lines
            let new_lines: Vec<NewOrderLineRow> = order
                .lines
                .iter()
                .enumerate()
                .map(|(position, l)| NewOrderLineRow {
                    id: Uuid::new_v4(),
                    order_id,
                    product_id: l.product_id,
                    position: position as i32,
                    rate_at_purchase: l.rate_at_purchase.clone(),
                    quantity: l.quantity.clone(),
                })
                .collect();
            diesel::insert_into(order_lines::table)
                .values(&new_lines)
                .execute(conn)?;

            // 4. Move the customer's balance in the same transaction
            store_outstanding(conn, order.customer_id, &outstanding_at_time + &effect)?;

            let mut views = with_lines(conn, vec![row])?;
            views.pop().ok_or(DomainError::NotFound("Order"))
        })
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        let order = orders::table
            .filter(orders::id.eq(id))
            .select(OrderRow::as_select())
            .first::<OrderRow>(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        Ok(with_lines(&mut conn, vec![order])?.pop())
    }

    fn list(&self, filter: &OrderFilter, page: i64, limit: i64) -> Result<ListResult, DomainError> {
        let mut conn = self.pool.get()?;

        let offset = page_offset(page, limit);
        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = filtered(filter).count().get_result(conn)?;

            let rows = filtered(filter)
                .select(OrderRow::as_select())
                .order((orders::date.desc(), orders::created_at.desc()))
                .limit(limit)
                .offset(offset)
                .load::<OrderRow>(conn)?;

            Ok(ListResult {
                items: with_lines(conn, rows)?,
                total,
            })
        })
    }

    fn find_all(&self, filter: &OrderFilter) -> Result<Vec<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let rows = filtered(filter)
                .select(OrderRow::as_select())
                .order((orders::date.asc(), orders::created_at.asc(), orders::id.asc()))
                .load::<OrderRow>(conn)?;
            with_lines(conn, rows)
        })
    }

    fn delete(&self, id: Uuid) -> Result<OrderView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let row = orders::table
                .find(id)
                .select(OrderRow::as_select())
                .for_update()
                .first::<OrderRow>(conn)
                .optional()?
                .ok_or(DomainError::NotFound("Order"))?;
            let order = with_lines(conn, vec![row])?
                .pop()
                .ok_or(DomainError::NotFound("Order"))?;

            let outstanding = lock_outstanding(conn, order.customer_id)?;
            diesel::delete(orders::table.find(id)).execute(conn)?;
            store_outstanding(conn, order.customer_id, outstanding - order.balance_effect())?;

            Ok(order)
        })
    }
}
