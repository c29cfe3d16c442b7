use bigdecimal::BigDecimal;
use uuid::Uuid;

use crate::domain::customer::{CustomerPatch, CustomerView, DefaultProduct, NewCustomer};
use crate::domain::errors::DomainError;
use crate::domain::ledger::{fold_balance, running_balances, Reconciliation, StatementLine};
use crate::domain::ports::{CustomerRepository, ProductRepository};

#[derive(Debug, Clone)]
pub struct Statement {
    pub customer: CustomerView,
    pub lines: Vec<StatementLine>,
    /// `opening_balance + Σ effect` over the ledger.
    pub derived_balance: BigDecimal,
}

impl Statement {
    pub fn in_sync(&self) -> bool {
        self.derived_balance == self.customer.outstanding_amount
    }
}

pub struct CustomerService<C, P> {
    customers: C,
    products: P,
}

impl<C: CustomerRepository, P: ProductRepository> CustomerService<C, P> {
    pub fn new(customers: C, products: P) -> Self {
        Self {
            customers,
            products,
        }
    }

    pub fn create_customer(&self, customer: NewCustomer) -> Result<CustomerView, DomainError> {
        customer.validate()?;
        self.ensure_products_exist(&customer.default_products)?;
        let created = self.customers.create(customer)?;
        log::info!("customer {} created", created.id);
        Ok(created)
    }

    pub fn list_customers(&self) -> Result<Vec<CustomerView>, DomainError> {
        self.customers.list()
    }

    pub fn get_customer(&self, id: Uuid) -> Result<Option<CustomerView>, DomainError> {
        self.customers.find_by_id(id)
    }

    pub fn update_customer(&self, id: Uuid, patch: CustomerPatch) -> Result<CustomerView, DomainError> {
        patch.validate()?;
        if let Some(dps) = &patch.default_products {
            self.ensure_products_exist(dps)?;
        }
        if let Some(amount) = &patch.outstanding_amount {
            log::info!("customer {id}: outstanding amount set by hand to {amount}");
        }
        self.customers.update(id, patch)
    }

    pub fn statement(&self, id: Uuid) -> Result<Statement, DomainError> {
        let customer = self
            .customers
            .find_by_id(id)?
            .ok_or(DomainError::NotFound("Customer"))?;
        let entries = self.customers.ledger(id)?;
        let derived_balance = fold_balance(&customer.opening_balance, &entries);
        let lines = running_balances(&customer.opening_balance, entries);
        Ok(Statement {
            customer,
            lines,
            derived_balance,
        })
    }

    /// Rewrites the cached outstanding amount from the ledger.
    pub fn reconcile(&self, id: Uuid) -> Result<Reconciliation, DomainError> {
        let report = self.customers.reconcile(id)?;
        if report.drifted {
            log::warn!(
                "customer {id}: cached balance {} drifted from ledger balance {}, rewritten",
                report.cached_balance,
                report.derived_balance
            );
        }
        Ok(report)
    }

    fn ensure_products_exist(&self, dps: &[DefaultProduct]) -> Result<(), DomainError> {
        for dp in dps {
            if self.products.find_by_id(dp.product_id)?.is_none() {
                return Err(DomainError::invalid(format!(
                    "unknown product {} in default products",
                    dp.product_id
                )));
            }
        }
        Ok(())
    }
}
