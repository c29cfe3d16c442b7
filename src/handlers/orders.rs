use actix_web::{web, HttpResponse};
use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::bills::SummaryResponse;
use super::{money, non_blank, parse_decimal, parse_optional_decimal, period, run};
use crate::application::order_service::OrderPreview;
use crate::domain::errors::DomainError;
use crate::domain::money::display_quantity;
use crate::domain::order::{OrderFilter, OrderInput, OrderLineInput, OrderView};
use crate::errors::AppError;
use crate::state::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderLineRequest {
    pub product_id: Uuid,
    /// Decimal quantity as a string, e.g. "1.5"
    pub quantity: String,
    /// Omit to charge the customer's price for the product.
    pub rate_at_purchase: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub customer_id: Uuid,
    /// Defaults to now.
    pub date: Option<DateTime<Utc>>,
    pub billed_by: Option<String>,
    #[serde(default)]
    pub is_return: bool,
    pub lines: Vec<CreateOrderLineRequest>,
    /// Settled at order time. Defaults to "0".
    pub paid: Option<String>,
}

impl TryFrom<CreateOrderRequest> for OrderInput {
    type Error = AppError;

    fn try_from(body: CreateOrderRequest) -> Result<Self, Self::Error> {
        let lines = body
            .lines
            .into_iter()
            .map(|l| {
                Ok(OrderLineInput {
                    product_id: l.product_id,
                    rate_at_purchase: parse_optional_decimal(
                        "rate_at_purchase",
                        l.rate_at_purchase.as_deref(),
                    )?,
                    quantity: parse_decimal("quantity", &l.quantity)?,
                })
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        Ok(OrderInput {
            customer_id: body.customer_id,
            date: body.date,
            billed_by: non_blank(body.billed_by),
            is_return: body.is_return,
            lines,
            paid: parse_optional_decimal("paid", body.paid.as_deref())?
                .unwrap_or_else(BigDecimal::zero),
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderLineResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub rate_at_purchase: String,
    pub quantity: String,
    pub amount: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub date: String,
    pub billed_by: Option<String>,
    pub is_return: bool,
    pub bill: String,
    pub paid: String,
    /// Customer balance just before this order was committed.
    pub outstanding_at_time: String,
    pub created_at: String,
    pub lines: Vec<OrderLineResponse>,
}

impl From<OrderView> for OrderResponse {
    fn from(o: OrderView) -> Self {
        OrderResponse {
            id: o.id,
            customer_id: o.customer_id,
            date: o.date.to_rfc3339(),
            billed_by: o.billed_by,
            is_return: o.is_return,
            bill: money(&o.bill),
            paid: money(&o.paid),
            outstanding_at_time: money(&o.outstanding_at_time),
            created_at: o.created_at.to_rfc3339(),
            lines: o
                .lines
                .into_iter()
                .map(|l| OrderLineResponse {
                    amount: money(&(&l.rate_at_purchase * &l.quantity)),
                    id: l.id,
                    product_id: l.product_id,
                    product_name: l.product_name,
                    rate_at_purchase: money(&l.rate_at_purchase),
                    quantity: display_quantity(&l.quantity),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PreviewLineResponse {
    pub product_id: Uuid,
    pub rate_at_purchase: String,
    pub quantity: String,
    pub amount: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderPreviewResponse {
    pub customer_id: Uuid,
    pub is_return: bool,
    pub lines: Vec<PreviewLineResponse>,
    pub summary: SummaryResponse,
}

impl From<OrderPreview> for OrderPreviewResponse {
    fn from(p: OrderPreview) -> Self {
        OrderPreviewResponse {
            customer_id: p.order.customer_id,
            is_return: p.order.is_return,
            lines: p
                .order
                .lines
                .iter()
                .map(|l| PreviewLineResponse {
                    product_id: l.product_id,
                    rate_at_purchase: money(&l.rate_at_purchase),
                    quantity: display_quantity(&l.quantity),
                    amount: money(&(&l.rate_at_purchase * &l.quantity)),
                })
                .collect(),
            summary: SummaryResponse::from(&p.summary),
        }
    }
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub customer_id: Option<Uuid>,
    pub billed_by: Option<String>,
    pub is_return: Option<bool>,
    /// A single day; wins over `start_date`/`end_date`.
    pub date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /orders
///
/// Newest first, with lines. Filters combine.
#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
        ("customer_id" = Option<Uuid>, Query, description = "Only this customer's orders"),
        ("billed_by" = Option<String>, Query, description = "Only orders billed by this person"),
        ("is_return" = Option<bool>, Query, description = "Only returns, or only sales"),
        ("date" = Option<NaiveDate>, Query, description = "Single day (YYYY-MM-DD)"),
        ("start_date" = Option<NaiveDate>, Query, description = "First day of a range"),
        ("end_date" = Option<NaiveDate>, Query, description = "Last day of a range, inclusive"),
    ),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
        (status = 400, description = "Invalid date range"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    state: web::Data<AppState>,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);
    let filter = OrderFilter {
        customer_id: params.customer_id,
        billed_by: non_blank(params.billed_by),
        is_return: params.is_return,
        period: period(params.date, params.start_date, params.end_date)?,
    };

    let result = run(move || state.orders.list_orders(&filter, page, limit)).await?;

    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        items: result.items.into_iter().map(Into::into).collect(),
        total: result.total,
        page,
        limit,
    }))
}

/// POST /orders
///
/// Commits a sale or return. The order, its lines and the customer's new
/// outstanding amount are written in a single database transaction.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderResponse),
        (status = 400, description = "Invalid order"),
        (status = 404, description = "Customer not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    state: web::Data<AppState>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let input = OrderInput::try_from(body.into_inner())?;
    let order = run(move || state.orders.create_order(input)).await?;
    Ok(HttpResponse::Created().json(OrderResponse::from(order)))
}

/// POST /orders/preview
///
/// Prices the order and shows the resulting balance without saving it.
#[utoipa::path(
    post,
    path = "/orders/preview",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Priced order and balance summary", body = OrderPreviewResponse),
        (status = 400, description = "Invalid order"),
        (status = 404, description = "Customer not found"),
    ),
    tag = "orders"
)]
pub async fn preview_order(
    state: web::Data<AppState>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let input = OrderInput::try_from(body.into_inner())?;
    let preview = run(move || state.orders.preview_order(input)).await?;
    Ok(HttpResponse::Ok().json(OrderPreviewResponse::from(preview)))
}

/// GET /orders/{id}
///
/// Returns the order together with its order lines.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let order = run(move || state.orders.get_order(order_id))
        .await?
        .ok_or(DomainError::NotFound("Order"))?;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// DELETE /orders/{id}
///
/// Removes the order and reverses its effect on the customer's balance.
#[utoipa::path(
    delete,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Deleted order", body = OrderResponse),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn delete_order(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let order = run(move || state.orders.delete_order(order_id)).await?;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderLineView;

    fn request() -> CreateOrderRequest {
        CreateOrderRequest {
            customer_id: Uuid::new_v4(),
            date: None,
            billed_by: Some(" ".into()),
            is_return: false,
            lines: vec![CreateOrderLineRequest {
                product_id: Uuid::new_v4(),
                quantity: "1.5".into(),
                rate_at_purchase: None,
            }],
            paid: None,
        }
    }

    #[test]
    fn request_defaults_paid_to_zero_and_drops_blank_biller() {
        let input = OrderInput::try_from(request()).unwrap();
        assert_eq!(input.paid, BigDecimal::zero());
        assert_eq!(input.billed_by, None);
        assert_eq!(input.lines[0].rate_at_purchase, None);
        assert_eq!(input.lines[0].quantity, "1.5".parse::<BigDecimal>().unwrap());
    }

    #[test]
    fn missing_quantity_is_a_bad_request() {
        let mut req = request();
        req.lines[0].quantity = "".into();
        let err = OrderInput::try_from(req).unwrap_err();
        assert_eq!(err.to_string(), "quantity is required");
    }

    #[test]
    fn return_flag_defaults_to_false_in_json() {
        let body = serde_json::json!({
            "customer_id": Uuid::new_v4(),
            "lines": [{ "product_id": Uuid::new_v4(), "quantity": "2" }]
        });
        let req: CreateOrderRequest = serde_json::from_value(body).unwrap();
        assert!(!req.is_return);
    }

    #[test]
    fn response_shows_line_amounts() {
        let order = OrderView {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            date: Utc::now(),
            billed_by: None,
            is_return: false,
            bill: "75".parse().unwrap(),
            paid: "0".parse().unwrap(),
            outstanding_at_time: "100".parse().unwrap(),
            created_at: Utc::now(),
            lines: vec![OrderLineView {
                id: Uuid::new_v4(),
                product_id: Uuid::new_v4(),
                product_name: "Milk".into(),
                rate_at_purchase: "50".parse().unwrap(),
                quantity: "1.5".parse().unwrap(),
            }],
        };
        let resp = OrderResponse::from(order);
        assert_eq!(resp.bill, "75.00");
        assert_eq!(resp.lines[0].quantity, "1.5");
        assert_eq!(resp.lines[0].amount, "75.00");
    }
}
