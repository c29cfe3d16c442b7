pub mod bills;
pub mod customers;
pub mod dashboard;
pub mod inventory;
pub mod orders;
pub mod payments;
pub mod products;

use std::str::FromStr;

use actix_web::web;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use utoipa::OpenApi;

use crate::domain::errors::DomainError;
use crate::domain::money::round2;
use crate::domain::period::DateRange;
use crate::errors::AppError;

#[derive(OpenApi)]
#[openapi(
    paths(
        customers::list_customers,
        customers::create_customer,
        customers::get_customer,
        customers::update_customer,
        customers::customer_statement,
        customers::reconcile_customer,
        products::list_products,
        products::create_product,
        products::get_product,
        products::update_product,
        products::delete_product,
        products::increment_price,
        orders::list_orders,
        orders::create_order,
        orders::preview_order,
        orders::get_order,
        orders::delete_order,
        payments::list_payments,
        payments::create_payment,
        payments::delete_payment,
        inventory::list_inventory,
        inventory::add_inventory,
        bills::daily_bill,
        bills::upload_image,
        bills::get_image,
        bills::share_bill,
        dashboard::dashboard,
    ),
    tags(
        (name = "customers", description = "Customers and their ledger"),
        (name = "products", description = "Product catalogue and pricing"),
        (name = "orders", description = "Sales and returns"),
        (name = "payments"),
        (name = "inventory"),
        (name = "bills", description = "Merged daily bills and sharing"),
        (name = "dashboard"),
    )
)]
pub struct ApiDoc;

/// Runs blocking repository work off the async executor.
pub(crate) async fn run<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, DomainError> + Send + 'static,
    T: Send + 'static,
{
    web::block(f)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(AppError::from)
}

/// Parses a decimal sent as a JSON string, e.g. `"9.99"`.
pub(crate) fn parse_decimal(field: &str, raw: &str) -> Result<BigDecimal, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    BigDecimal::from_str(raw)
        .map_err(|_| AppError::BadRequest(format!("invalid {field} '{raw}'")))
}

pub(crate) fn parse_optional_decimal(
    field: &str,
    raw: Option<&str>,
) -> Result<Option<BigDecimal>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_decimal(field, raw).map(Some),
    }
}

/// Two-decimal string for amounts leaving the API.
pub(crate) fn money(value: &BigDecimal) -> String {
    round2(value).to_string()
}

/// `date` wins over `start_date`/`end_date`; no dates at all means no
/// period.
pub(crate) fn period(
    date: Option<NaiveDate>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<Option<DateRange>, AppError> {
    Ok(DateRange::from_parts(date, start_date, end_date)?)
}

/// Blank optional text fields are treated as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
