use actix_web::{web, HttpResponse};
use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{money, non_blank, parse_decimal, parse_optional_decimal, run};
use crate::application::customer_service::Statement;
use crate::domain::customer::{CustomerPatch, CustomerView, DefaultProduct, NewCustomer};
use crate::domain::errors::DomainError;
use crate::domain::ledger::Reconciliation;
use crate::errors::AppError;
use crate::state::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DefaultProductDto {
    pub product_id: Uuid,
    /// Overrides the product's default price for this customer, e.g. "48.00"
    pub custom_price: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCustomerRequest {
    pub name: String,
    pub phone: String,
    pub address: Option<String>,
    pub notes: Option<String>,
    /// Balance carried over from before the customer was entered. Defaults
    /// to "0".
    pub outstanding_amount: Option<String>,
    #[serde(default)]
    pub default_products: Vec<DefaultProductDto>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCustomerRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    /// Setting this by hand adjusts the opening balance.
    pub outstanding_amount: Option<String>,
    /// Replaces the whole list when present.
    pub default_products: Option<Vec<DefaultProductDto>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerResponse {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub opening_balance: String,
    pub outstanding_amount: String,
    pub default_products: Vec<DefaultProductDto>,
}

impl From<CustomerView> for CustomerResponse {
    fn from(c: CustomerView) -> Self {
        CustomerResponse {
            id: c.id,
            name: c.name,
            phone: c.phone,
            address: c.address,
            notes: c.notes,
            opening_balance: money(&c.opening_balance),
            outstanding_amount: money(&c.outstanding_amount),
            default_products: c
                .default_products
                .into_iter()
                .map(|dp| DefaultProductDto {
                    product_id: dp.product_id,
                    custom_price: dp.custom_price.as_ref().map(money),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatementEntryResponse {
    pub id: Uuid,
    /// `sale`, `return` or `payment`
    pub kind: String,
    pub date: String,
    pub amount: String,
    pub paid: String,
    /// Signed change to the balance.
    pub effect: String,
    pub balance_after: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatementResponse {
    pub customer_id: Uuid,
    pub customer_name: String,
    pub opening_balance: String,
    pub entries: Vec<StatementEntryResponse>,
    pub derived_balance: String,
    pub cached_balance: String,
    pub in_sync: bool,
}

impl From<Statement> for StatementResponse {
    fn from(s: Statement) -> Self {
        let in_sync = s.in_sync();
        StatementResponse {
            customer_id: s.customer.id,
            customer_name: s.customer.name,
            opening_balance: money(&s.customer.opening_balance),
            entries: s
                .lines
                .into_iter()
                .map(|line| StatementEntryResponse {
                    id: line.entry.id,
                    kind: line.entry.kind.as_str().to_string(),
                    date: line.entry.date.to_rfc3339(),
                    amount: money(&line.entry.amount),
                    paid: money(&line.entry.paid),
                    effect: money(&line.entry.effect()),
                    balance_after: money(&line.balance_after),
                })
                .collect(),
            derived_balance: money(&s.derived_balance),
            cached_balance: money(&s.customer.outstanding_amount),
            in_sync,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReconcileResponse {
    pub customer_id: Uuid,
    /// Balance stored before reconciling.
    pub cached_balance: String,
    pub derived_balance: String,
    /// True when the stored balance was rewritten.
    pub drifted: bool,
}

impl From<Reconciliation> for ReconcileResponse {
    fn from(r: Reconciliation) -> Self {
        ReconcileResponse {
            customer_id: r.customer_id,
            cached_balance: money(&r.cached_balance),
            derived_balance: money(&r.derived_balance),
            drifted: r.drifted,
        }
    }
}

fn default_products(dtos: Vec<DefaultProductDto>) -> Result<Vec<DefaultProduct>, AppError> {
    dtos.into_iter()
        .map(|dto| {
            Ok(DefaultProduct {
                product_id: dto.product_id,
                custom_price: parse_optional_decimal("custom_price", dto.custom_price.as_deref())?,
            })
        })
        .collect()
}

impl TryFrom<CreateCustomerRequest> for NewCustomer {
    type Error = AppError;

    fn try_from(body: CreateCustomerRequest) -> Result<Self, Self::Error> {
        let outstanding_amount = match body.outstanding_amount.as_deref() {
            Some(raw) if !raw.trim().is_empty() => parse_decimal("outstanding_amount", raw)?,
            _ => BigDecimal::zero(),
        };
        Ok(NewCustomer {
            name: body.name,
            phone: body.phone,
            address: non_blank(body.address),
            notes: non_blank(body.notes),
            outstanding_amount,
            default_products: default_products(body.default_products)?,
        })
    }
}

impl TryFrom<UpdateCustomerRequest> for CustomerPatch {
    type Error = AppError;

    fn try_from(body: UpdateCustomerRequest) -> Result<Self, Self::Error> {
        Ok(CustomerPatch {
            name: body.name,
            phone: body.phone,
            address: body.address,
            notes: body.notes,
            outstanding_amount: parse_optional_decimal(
                "outstanding_amount",
                body.outstanding_amount.as_deref(),
            )?,
            default_products: body.default_products.map(default_products).transpose()?,
        })
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/customers",
    responses(
        (status = 200, description = "All customers by name", body = [CustomerResponse]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "customers"
)]
pub async fn list_customers(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let customers = run(move || state.customers.list_customers()).await?;
    let body: Vec<CustomerResponse> = customers.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// POST /customers
///
/// The initial `outstanding_amount` becomes the customer's opening balance.
#[utoipa::path(
    post,
    path = "/customers",
    request_body = CreateCustomerRequest,
    responses(
        (status = 201, description = "Customer created", body = CustomerResponse),
        (status = 400, description = "Invalid customer"),
    ),
    tag = "customers"
)]
pub async fn create_customer(
    state: web::Data<AppState>,
    body: web::Json<CreateCustomerRequest>,
) -> Result<HttpResponse, AppError> {
    let customer = NewCustomer::try_from(body.into_inner())?;
    let created = run(move || state.customers.create_customer(customer)).await?;
    Ok(HttpResponse::Created().json(CustomerResponse::from(created)))
}

#[utoipa::path(
    get,
    path = "/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer UUID")),
    responses(
        (status = 200, description = "Customer found", body = CustomerResponse),
        (status = 404, description = "Customer not found"),
    ),
    tag = "customers"
)]
pub async fn get_customer(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let customer = run(move || state.customers.get_customer(id))
        .await?
        .ok_or(DomainError::NotFound("Customer"))?;
    Ok(HttpResponse::Ok().json(CustomerResponse::from(customer)))
}

#[utoipa::path(
    patch,
    path = "/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer UUID")),
    request_body = UpdateCustomerRequest,
    responses(
        (status = 200, description = "Customer updated", body = CustomerResponse),
        (status = 400, description = "Invalid patch"),
        (status = 404, description = "Customer not found"),
    ),
    tag = "customers"
)]
pub async fn update_customer(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateCustomerRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let patch = CustomerPatch::try_from(body.into_inner())?;
    let updated = run(move || state.customers.update_customer(id, patch)).await?;
    Ok(HttpResponse::Ok().json(CustomerResponse::from(updated)))
}

/// GET /customers/{id}/statement
///
/// Every sale, return and payment in processing order with the running
/// balance after each one.
#[utoipa::path(
    get,
    path = "/customers/{id}/statement",
    params(("id" = Uuid, Path, description = "Customer UUID")),
    responses(
        (status = 200, description = "Ledger statement", body = StatementResponse),
        (status = 404, description = "Customer not found"),
    ),
    tag = "customers"
)]
pub async fn customer_statement(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let statement = run(move || state.customers.statement(id)).await?;
    Ok(HttpResponse::Ok().json(StatementResponse::from(statement)))
}

#[utoipa::path(
    post,
    path = "/customers/{id}/reconcile",
    params(("id" = Uuid, Path, description = "Customer UUID")),
    responses(
        (status = 200, description = "Stored balance checked against the ledger", body = ReconcileResponse),
        (status = 404, description = "Customer not found"),
    ),
    tag = "customers"
)]
pub async fn reconcile_customer(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let outcome = run(move || state.customers.reconcile(id)).await?;
    Ok(HttpResponse::Ok().json(ReconcileResponse::from(outcome)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request(outstanding: Option<&str>) -> CreateCustomerRequest {
        CreateCustomerRequest {
            name: "Ravi".into(),
            phone: "98765 43210".into(),
            address: Some("  ".into()),
            notes: None,
            outstanding_amount: outstanding.map(String::from),
            default_products: vec![DefaultProductDto {
                product_id: Uuid::new_v4(),
                custom_price: Some("48".into()),
            }],
        }
    }

    #[test]
    fn missing_outstanding_amount_starts_at_zero() {
        let customer = NewCustomer::try_from(create_request(None)).unwrap();
        assert_eq!(customer.outstanding_amount, BigDecimal::zero());
        assert_eq!(customer.address, None);
        assert_eq!(customer.default_products.len(), 1);
    }

    #[test]
    fn bad_custom_price_is_rejected() {
        let mut req = create_request(Some("100"));
        req.default_products[0].custom_price = Some("cheap".into());
        assert!(matches!(
            NewCustomer::try_from(req),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn patch_without_default_products_keeps_them() {
        let patch = CustomerPatch::try_from(UpdateCustomerRequest {
            name: None,
            phone: None,
            address: None,
            notes: None,
            outstanding_amount: Some("80".into()),
            default_products: None,
        })
        .unwrap();
        assert!(patch.default_products.is_none());
        assert_eq!(patch.outstanding_amount, Some(BigDecimal::from(80)));
    }
}
