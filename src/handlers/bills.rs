use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{money, period, run};
use crate::application::order_service::DailyBill;
use crate::billing::{BalanceSummary, MergedProductLine};
use crate::domain::errors::DomainError;
use crate::domain::money::display_quantity;
use crate::errors::AppError;
use crate::state::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

/// Balance summary with every figure rounded to two decimals.
#[derive(Debug, Serialize, ToSchema)]
pub struct SummaryResponse {
    pub old_balance: String,
    /// Sum of the order bills as stored, returns included unsigned.
    pub bill: String,
    /// Return-adjusted bill that actually moves the balance.
    pub net_bill: String,
    pub paid: String,
    pub total: String,
    pub new_balance: String,
}

impl From<&BalanceSummary> for SummaryResponse {
    fn from(s: &BalanceSummary) -> Self {
        let s = s.rounded();
        SummaryResponse {
            old_balance: s.old_balance.to_string(),
            bill: s.gross_bill.to_string(),
            net_bill: s.net_bill.to_string(),
            paid: s.paid.to_string(),
            total: s.total.to_string(),
            new_balance: s.new_balance.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BillLineResponse {
    pub product_id: Uuid,
    pub name: String,
    /// Quantity per contributing order, e.g. `["2", "-1", "+3"]`.
    pub quantities: Vec<String>,
    pub net_quantity: String,
    pub net_amount: String,
}

impl From<MergedProductLine> for BillLineResponse {
    fn from(line: MergedProductLine) -> Self {
        BillLineResponse {
            quantities: line.quantity_tokens(),
            net_quantity: display_quantity(&line.net_quantity),
            net_amount: money(&line.net_amount),
            product_id: line.product_id,
            name: line.name,
        }
    }
}

#[derive(Debug, Default, Serialize, ToSchema)]
pub struct DailyBillResponse {
    pub customer_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub lines: Vec<BillLineResponse>,
    /// Absent when no orders matched; nothing should be rendered.
    pub summary: Option<SummaryResponse>,
    pub order_count: usize,
}

impl From<DailyBill> for DailyBillResponse {
    fn from(bill: DailyBill) -> Self {
        DailyBillResponse {
            customer_id: Some(bill.customer_id),
            customer_name: Some(bill.customer_name),
            start_date: bill.period.start,
            end_date: bill.period.end,
            summary: bill.summary.as_ref().map(SummaryResponse::from),
            order_count: bill.merged.order_count,
            lines: bill.merged.lines.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DailyBillParams {
    pub customer_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UploadImageRequest {
    /// `data:image/png;base64,...` or `data:image/jpeg;base64,...`
    pub image_data: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadImageResponse {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ShareBillRequest {
    pub customer_id: Uuid,
    /// Day printed in the message.
    pub date: NaiveDate,
    pub image_data: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ShareBillResponse {
    pub url: String,
    /// `https://wa.me/...` link with the message pre-filled.
    pub share_link: String,
}

fn content_type(name: &str) -> &'static str {
    if name.ends_with(".png") {
        "image/png"
    } else {
        "image/jpeg"
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /bills/daily
///
/// Merges the customer's orders for one day or a range into a single bill.
/// Without a customer or any date the response is an empty bill.
#[utoipa::path(
    get,
    path = "/bills/daily",
    params(
        ("customer_id" = Option<Uuid>, Query, description = "Customer to bill"),
        ("date" = Option<NaiveDate>, Query, description = "Single day (YYYY-MM-DD)"),
        ("start_date" = Option<NaiveDate>, Query, description = "First day of a range"),
        ("end_date" = Option<NaiveDate>, Query, description = "Last day of a range, inclusive"),
    ),
    responses(
        (status = 200, description = "Merged bill, possibly empty", body = DailyBillResponse),
        (status = 400, description = "Invalid date range"),
        (status = 404, description = "Customer not found"),
    ),
    tag = "bills"
)]
pub async fn daily_bill(
    state: web::Data<AppState>,
    query: web::Query<DailyBillParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let range = period(params.date, params.start_date, params.end_date)?;
    let (Some(customer_id), Some(range)) = (params.customer_id, range) else {
        return Ok(HttpResponse::Ok().json(DailyBillResponse::default()));
    };

    let bill = run(move || state.orders.daily_bill(customer_id, range)).await?;
    Ok(HttpResponse::Ok().json(DailyBillResponse::from(bill)))
}

#[utoipa::path(
    post,
    path = "/bills/images",
    request_body = UploadImageRequest,
    responses(
        (status = 201, description = "Image stored", body = UploadImageResponse),
        (status = 400, description = "Not a PNG/JPEG data URL, or too large"),
    ),
    tag = "bills"
)]
pub async fn upload_image(
    state: web::Data<AppState>,
    body: web::Json<UploadImageRequest>,
) -> Result<HttpResponse, AppError> {
    let data_url = body.into_inner().image_data;
    let stored = run(move || state.bills.upload_image(&data_url)).await?;
    Ok(HttpResponse::Created().json(UploadImageResponse {
        name: stored.name,
        url: stored.url,
    }))
}

#[utoipa::path(
    get,
    path = "/bills/images/{name}",
    params(("name" = String, Path, description = "Stored image name")),
    responses(
        (status = 200, description = "PNG or JPEG image bytes"),
        (status = 404, description = "No such image"),
    ),
    tag = "bills"
)]
pub async fn get_image(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let name = path.into_inner();
    let lookup = name.clone();
    let bytes = run(move || state.bills.image(&lookup))
        .await?
        .ok_or(DomainError::NotFound("Image"))?;
    Ok(HttpResponse::Ok()
        .content_type(content_type(&name))
        .body(bytes))
}

/// POST /bills/share
///
/// Stores the rendered bill and returns a WhatsApp link to the customer's
/// phone with the bill URL in the message.
#[utoipa::path(
    post,
    path = "/bills/share",
    request_body = ShareBillRequest,
    responses(
        (status = 200, description = "Bill stored and link built", body = ShareBillResponse),
        (status = 400, description = "Invalid image or customer has no usable phone"),
        (status = 404, description = "Customer not found"),
    ),
    tag = "bills"
)]
pub async fn share_bill(
    state: web::Data<AppState>,
    body: web::Json<ShareBillRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let shared =
        run(move || state.bills.share_bill(body.customer_id, body.date, &body.image_data)).await?;
    Ok(HttpResponse::Ok().json(ShareBillResponse {
        url: shared.url,
        share_link: shared.share_link,
    }))
}
