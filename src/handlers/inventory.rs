use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{parse_decimal, run};
use crate::domain::inventory::{InventoryItemInput, InventoryItemView, InventoryView, NewInventory};
use crate::domain::money::display_quantity;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct InventoryItemRequest {
    pub product_id: Uuid,
    pub quantity: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddInventoryRequest {
    pub date: NaiveDate,
    pub items: Vec<InventoryItemRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InventoryItemResponse {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: String,
}

impl From<InventoryItemView> for InventoryItemResponse {
    fn from(i: InventoryItemView) -> Self {
        InventoryItemResponse {
            product_id: i.product_id,
            product_name: i.product_name,
            quantity: display_quantity(&i.quantity),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InventoryResponse {
    pub id: Uuid,
    pub date: NaiveDate,
    pub items: Vec<InventoryItemResponse>,
}

impl From<InventoryView> for InventoryResponse {
    fn from(v: InventoryView) -> Self {
        InventoryResponse {
            id: v.id,
            date: v.date,
            items: v.items.into_iter().map(Into::into).collect(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/inventory/{date}",
    params(("date" = NaiveDate, Path, description = "Day (YYYY-MM-DD)")),
    responses(
        (status = 200, description = "Stock entries recorded for the day", body = [InventoryResponse]),
    ),
    tag = "inventory"
)]
pub async fn list_inventory(
    state: web::Data<AppState>,
    path: web::Path<NaiveDate>,
) -> Result<HttpResponse, AppError> {
    let date = path.into_inner();
    let entries = run(move || state.inventory.list_inventory(date)).await?;
    let body: Vec<InventoryResponse> = entries.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    post,
    path = "/inventory",
    request_body = AddInventoryRequest,
    responses(
        (status = 201, description = "Stock entry recorded", body = InventoryResponse),
        (status = 400, description = "Invalid entry"),
        (status = 409, description = "Unknown product"),
    ),
    tag = "inventory"
)]
pub async fn add_inventory(
    state: web::Data<AppState>,
    body: web::Json<AddInventoryRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let items = body
        .items
        .into_iter()
        .map(|i| {
            Ok(InventoryItemInput {
                product_id: i.product_id,
                quantity: parse_decimal("quantity", &i.quantity)?,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;
    let inventory = NewInventory {
        date: body.date,
        items,
    };

    let created = run(move || state.inventory.add_inventory(inventory)).await?;
    Ok(HttpResponse::Created().json(InventoryResponse::from(created)))
}
