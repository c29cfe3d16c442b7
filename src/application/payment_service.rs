use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::payment::{NewPayment, PaymentFilter, PaymentView};
use crate::domain::ports::{CustomerRepository, PaymentRepository};

pub struct PaymentService<R, C> {
    payments: R,
    customers: C,
}

impl<R: PaymentRepository, C: CustomerRepository> PaymentService<R, C> {
    pub fn new(payments: R, customers: C) -> Self {
        Self {
            payments,
            customers,
        }
    }

    pub fn create_payment(&self, payment: NewPayment) -> Result<PaymentView, DomainError> {
        payment.validate()?;
        if self.customers.find_by_id(payment.customer_id)?.is_none() {
            return Err(DomainError::NotFound("Customer"));
        }
        let created = self.payments.create(payment)?;
        log::info!(
            "payment {} of {} ({}) committed for customer {}",
            created.id,
            created.amount,
            created.mode_of_payment,
            created.customer_id
        );
        Ok(created)
    }

    /// Newest first.
    pub fn list_payments(&self, filter: &PaymentFilter) -> Result<Vec<PaymentView>, DomainError> {
        let mut payments = self.payments.list(filter)?;
        payments.sort_by(|a, b| (b.date, b.created_at).cmp(&(a.date, a.created_at)));
        Ok(payments)
    }

    pub fn delete_payment(&self, id: Uuid) -> Result<PaymentView, DomainError> {
        let payment = self.payments.delete(id)?;
        log::info!(
            "payment {} deleted, balance of customer {} moved by {}",
            payment.id,
            payment.customer_id,
            payment.amount
        );
        Ok(payment)
    }
}
