use actix_web::{web, HttpResponse};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::inventory::InventoryItemResponse;
use super::{money, run};
use crate::billing::summary::DailySnapshot;
use crate::domain::money::display_quantity;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DashboardParams {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub date: NaiveDate,
    pub inventory: Vec<InventoryItemResponse>,
    /// Quantity sold that day, net of returns.
    pub net_quantity_sold: String,
    pub payments_collected: String,
    /// Sum of every customer's outstanding amount right now.
    pub total_outstanding: String,
}

impl From<DailySnapshot> for DashboardResponse {
    fn from(s: DailySnapshot) -> Self {
        DashboardResponse {
            date: s.date,
            inventory: s.inventory.into_iter().map(Into::into).collect(),
            net_quantity_sold: display_quantity(&s.net_quantity_sold),
            payments_collected: money(&s.payments_collected),
            total_outstanding: money(&s.total_outstanding),
        }
    }
}

#[utoipa::path(
    get,
    path = "/dashboard",
    params(("date" = Option<NaiveDate>, Query, description = "Day to summarise, defaults to today (UTC)")),
    responses(
        (status = 200, description = "Figures for the day", body = DashboardResponse),
    ),
    tag = "dashboard"
)]
pub async fn dashboard(
    state: web::Data<AppState>,
    query: web::Query<DashboardParams>,
) -> Result<HttpResponse, AppError> {
    let date = query
        .into_inner()
        .date
        .unwrap_or_else(|| Utc::now().date_naive());
    let snapshot = run(move || state.dashboard.snapshot(date)).await?;
    Ok(HttpResponse::Ok().json(DashboardResponse::from(snapshot)))
}
