use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use crate::billing::{merge_orders, processing_order, BalanceSummary, MergedBill};
use crate::domain::customer::CustomerView;
use crate::domain::errors::DomainError;
use crate::domain::ledger::{balance_before, LedgerEntry};
use crate::domain::order::{ListResult, NewOrder, OrderFilter, OrderInput, OrderView, PricedLine};
use crate::domain::period::DateRange;
use crate::domain::ports::{CustomerRepository, OrderRepository, ProductRepository};

/// One customer's merged statement over a day or range.
#[derive(Debug, Clone)]
pub struct DailyBill {
    pub customer_id: Uuid,
    pub customer_name: String,
    pub period: DateRange,
    pub merged: MergedBill,
    /// `None` when no orders matched; nothing should be rendered.
    pub summary: Option<BalanceSummary>,
}

#[derive(Debug, Clone)]
pub struct OrderPreview {
    pub order: NewOrder,
    pub summary: BalanceSummary,
}

pub struct OrderService<O, C, P> {
    orders: O,
    customers: C,
    products: P,
}

impl<O: OrderRepository, C: CustomerRepository, P: ProductRepository> OrderService<O, C, P> {
    pub fn new(orders: O, customers: C, products: P) -> Self {
        Self {
            orders,
            customers,
            products,
        }
    }

    pub fn create_order(&self, input: OrderInput) -> Result<OrderView, DomainError> {
        let customer = self.customer(input.customer_id)?;
        let new_order = self.price_order(&customer, input)?;
        let order = self.orders.create(new_order)?;
        log::info!(
            "order {} committed for customer {} (return: {}, bill: {}, paid: {})",
            order.id,
            order.customer_id,
            order.is_return,
            order.bill,
            order.paid
        );
        Ok(order)
    }

    /// What committing `input` would do to the customer's balance, without
    /// writing anything.
    pub fn preview_order(&self, input: OrderInput) -> Result<OrderPreview, DomainError> {
        let customer = self.customer(input.customer_id)?;
        let order = self.price_order(&customer, input)?;
        let summary = BalanceSummary::for_new_order(customer.outstanding_amount.clone(), &order);
        Ok(OrderPreview { order, summary })
    }

    pub fn get_order(&self, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        self.orders.find_by_id(id)
    }

    pub fn list_orders(
        &self,
        filter: &OrderFilter,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError> {
        self.orders.list(filter, page, limit)
    }

    pub fn find_orders(&self, filter: &OrderFilter) -> Result<Vec<OrderView>, DomainError> {
        self.orders.find_all(filter)
    }

    pub fn delete_order(&self, id: Uuid) -> Result<OrderView, DomainError> {
        let order = self.orders.delete(id)?;
        log::info!(
            "order {} deleted, balance of customer {} moved by {}",
            order.id,
            order.customer_id,
            -order.balance_effect()
        );
        Ok(order)
    }

    /// Merges every order the customer placed within `period`.
    pub fn daily_bill(&self, customer_id: Uuid, period: DateRange) -> Result<DailyBill, DomainError> {
        let customer = self.customer(customer_id)?;
        let filter = OrderFilter {
            customer_id: Some(customer_id),
            period: Some(period),
            ..Default::default()
        };
        let orders = self.orders.find_all(&filter)?;
        let mut merged = merge_orders(&orders);

        // Snapshots are taken at commit time, so a backdated order carries
        // one that already includes later-dated orders.
        if let Some(first) = processing_order(&orders).first() {
            let entries = self.customers.ledger(customer_id)?;
            merged.old_balance = Some(balance_before(
                &customer.opening_balance,
                &entries,
                &LedgerEntry::from(*first),
            ));
        }
        let summary = BalanceSummary::from_merged(&merged);

        Ok(DailyBill {
            customer_id,
            customer_name: customer.name,
            period,
            merged,
            summary,
        })
    }

    fn customer(&self, id: Uuid) -> Result<CustomerView, DomainError> {
        self.customers
            .find_by_id(id)?
            .ok_or(DomainError::NotFound("Customer"))
    }

    /// Validates the input and fills every missing rate with the customer's
    /// effective price for that product.
    fn price_order(&self, customer: &CustomerView, input: OrderInput) -> Result<NewOrder, DomainError> {
        input.validate()?;

        let catalog: HashMap<Uuid, _> = self
            .products
            .list()?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let lines = input
            .lines
            .into_iter()
            .map(|line| {
                let product = catalog.get(&line.product_id).ok_or_else(|| {
                    DomainError::invalid(format!("unknown product {}", line.product_id))
                })?;
                let rate_at_purchase = line
                    .rate_at_purchase
                    .unwrap_or_else(|| customer.effective_price(product));
                Ok(PricedLine {
                    product_id: line.product_id,
                    rate_at_purchase,
                    quantity: line.quantity,
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        Ok(NewOrder {
            customer_id: customer.id,
            date: input.date.unwrap_or_else(Utc::now),
            billed_by: input.billed_by.filter(|b| !b.trim().is_empty()),
            is_return: input.is_return,
            lines,
            paid: input.paid,
        })
    }
}
