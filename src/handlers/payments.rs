use actix_web::{web, HttpResponse};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{money, non_blank, parse_decimal, period, run};
use crate::domain::payment::{NewPayment, PaymentFilter, PaymentMode, PaymentView};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePaymentRequest {
    pub customer_id: Uuid,
    /// Decimal amount as a string, e.g. "500"
    pub amount: String,
    /// `cash`, `online`, `cheque`, `cash+online`, `cash+cheque` or
    /// `cheque+online`
    pub mode_of_payment: String,
    /// Defaults to now.
    pub date: Option<DateTime<Utc>>,
    pub paid_to: Option<String>,
    pub notes: Option<String>,
}

impl TryFrom<CreatePaymentRequest> for NewPayment {
    type Error = AppError;

    fn try_from(body: CreatePaymentRequest) -> Result<Self, Self::Error> {
        Ok(NewPayment {
            customer_id: body.customer_id,
            date: body.date.unwrap_or_else(Utc::now),
            amount: parse_decimal("amount", &body.amount)?,
            mode_of_payment: body.mode_of_payment.parse::<PaymentMode>()?,
            paid_to: non_blank(body.paid_to),
            notes: non_blank(body.notes),
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub date: String,
    pub amount: String,
    pub mode_of_payment: String,
    pub paid_to: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
}

impl From<PaymentView> for PaymentResponse {
    fn from(p: PaymentView) -> Self {
        PaymentResponse {
            id: p.id,
            customer_id: p.customer_id,
            date: p.date.to_rfc3339(),
            amount: money(&p.amount),
            mode_of_payment: p.mode_of_payment.to_string(),
            paid_to: p.paid_to,
            notes: p.notes,
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListPaymentsParams {
    pub customer_id: Option<Uuid>,
    pub mode_of_payment: Option<String>,
    pub paid_to: Option<String>,
    pub date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl TryFrom<ListPaymentsParams> for PaymentFilter {
    type Error = AppError;

    fn try_from(params: ListPaymentsParams) -> Result<Self, Self::Error> {
        Ok(PaymentFilter {
            customer_id: params.customer_id,
            mode_of_payment: non_blank(params.mode_of_payment)
                .map(|m| m.parse::<PaymentMode>())
                .transpose()?,
            paid_to: non_blank(params.paid_to),
            period: period(params.date, params.start_date, params.end_date)?,
        })
    }
}

#[utoipa::path(
    get,
    path = "/payments",
    params(
        ("customer_id" = Option<Uuid>, Query, description = "Only this customer's payments"),
        ("mode_of_payment" = Option<String>, Query, description = "Only this mode"),
        ("paid_to" = Option<String>, Query, description = "Only payments collected by this person"),
        ("date" = Option<NaiveDate>, Query, description = "Single day (YYYY-MM-DD)"),
        ("start_date" = Option<NaiveDate>, Query, description = "First day of a range"),
        ("end_date" = Option<NaiveDate>, Query, description = "Last day of a range, inclusive"),
    ),
    responses(
        (status = 200, description = "Payments, newest first", body = [PaymentResponse]),
        (status = 400, description = "Invalid filter"),
    ),
    tag = "payments"
)]
pub async fn list_payments(
    state: web::Data<AppState>,
    query: web::Query<ListPaymentsParams>,
) -> Result<HttpResponse, AppError> {
    let filter = PaymentFilter::try_from(query.into_inner())?;
    let payments = run(move || state.payments.list_payments(&filter)).await?;
    let body: Vec<PaymentResponse> = payments.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// POST /payments
///
/// Records money received outside an order and lowers the customer's
/// outstanding amount in the same transaction.
#[utoipa::path(
    post,
    path = "/payments",
    request_body = CreatePaymentRequest,
    responses(
        (status = 201, description = "Payment recorded", body = PaymentResponse),
        (status = 400, description = "Invalid payment"),
        (status = 404, description = "Customer not found"),
    ),
    tag = "payments"
)]
pub async fn create_payment(
    state: web::Data<AppState>,
    body: web::Json<CreatePaymentRequest>,
) -> Result<HttpResponse, AppError> {
    let payment = NewPayment::try_from(body.into_inner())?;
    let created = run(move || state.payments.create_payment(payment)).await?;
    Ok(HttpResponse::Created().json(PaymentResponse::from(created)))
}

#[utoipa::path(
    delete,
    path = "/payments/{id}",
    params(("id" = Uuid, Path, description = "Payment UUID")),
    responses(
        (status = 200, description = "Deleted payment", body = PaymentResponse),
        (status = 404, description = "Payment not found"),
    ),
    tag = "payments"
)]
pub async fn delete_payment(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let deleted = run(move || state.payments.delete_payment(id)).await?;
    Ok(HttpResponse::Ok().json(PaymentResponse::from(deleted)))
}
