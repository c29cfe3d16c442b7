use chrono::Utc;
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::payment::{NewPayment, PaymentFilter, PaymentView};
use crate::domain::ports::PaymentRepository;
use crate::schema::{customers, payments};

use super::models::{NewPaymentRow, PaymentRow};

impl TryFrom<PaymentRow> for PaymentView {
    type Error = DomainError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(PaymentView {
            id: row.id,
            customer_id: row.customer_id,
            date: row.date,
            amount: row.amount,
            mode_of_payment: row
                .mode_of_payment
                .parse()
                .map_err(|e: DomainError| DomainError::Internal(e.to_string()))?,
            paid_to: row.paid_to,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

fn filtered(filter: &PaymentFilter) -> payments::BoxedQuery<'static, Pg> {
    let mut query = payments::table.into_boxed();
    if let Some(customer_id) = filter.customer_id {
        query = query.filter(payments::customer_id.eq(customer_id));
    }
    if let Some(mode) = filter.mode_of_payment {
        query = query.filter(payments::mode_of_payment.eq(mode.as_str()));
    }
    if let Some(paid_to) = &filter.paid_to {
        query = query.filter(payments::paid_to.eq(paid_to.clone()));
    }
    if let Some(period) = filter.period {
        let (from, until) = period.bounds();
        if let Some(from) = from {
            query = query.filter(payments::date.ge(from));
        }
        if let Some(until) = until {
            query = query.filter(payments::date.lt(until));
        }
    }
    query
}

/// Applies `delta` to the customer's cached balance, failing when the
/// customer does not exist.
fn shift_outstanding(
    conn: &mut PgConnection,
    customer_id: Uuid,
    delta: bigdecimal::BigDecimal,
) -> Result<(), DomainError> {
    let updated = diesel::update(customers::table.find(customer_id))
        .set((
            customers::outstanding_amount.eq(customers::outstanding_amount + delta),
            customers::updated_at.eq(Utc::now()),
        ))
        .execute(conn)?;
    if updated == 0 {
        return Err(DomainError::NotFound("Customer"));
    }
    Ok(())
}

pub struct DieselPaymentRepository {
    pool: DbPool,
}

impl DieselPaymentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl PaymentRepository for DieselPaymentRepository {
    fn create(&self, payment: NewPayment) -> Result<PaymentView, DomainError> {
        let mut conn = self.pool.get()?;
        let effect = payment.balance_effect();

        conn.transaction::<_, DomainError, _>(|conn| {
            shift_outstanding(conn, payment.customer_id, effect)?;
            let row = diesel::insert_into(payments::table)
                .values(&NewPaymentRow {
                    id: Uuid::new_v4(),
                    customer_id: payment.customer_id,
                    date: payment.date,
                    amount: payment.amount,
                    mode_of_payment: payment.mode_of_payment.as_str().to_string(),
                    paid_to: payment.paid_to,
                    notes: payment.notes,
                })
                .returning(PaymentRow::as_returning())
                .get_result::<PaymentRow>(conn)?;
            row.try_into()
        })
    }

    fn list(&self, filter: &PaymentFilter) -> Result<Vec<PaymentView>, DomainError> {
        let mut conn = self.pool.get()?;
        filtered(filter)
            .select(PaymentRow::as_select())
            .order((payments::date.desc(), payments::created_at.desc()))
            .load::<PaymentRow>(&mut conn)?
            .into_iter()
            .map(PaymentView::try_from)
            .collect()
    }

    fn delete(&self, id: Uuid) -> Result<PaymentView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let row = diesel::delete(payments::table.find(id))
                .returning(PaymentRow::as_returning())
                .get_result::<PaymentRow>(conn)
                .optional()?
                .ok_or(DomainError::NotFound("Payment"))?;
            let payment = PaymentView::try_from(row)?;
            shift_outstanding(conn, payment.customer_id, -payment.balance_effect())?;
            Ok(payment)
        })
    }
}
