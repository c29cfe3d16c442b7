use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{money, parse_decimal, parse_optional_decimal, run};
use crate::domain::errors::DomainError;
use crate::domain::pricing::PropagationOutcome;
use crate::domain::product::{NewProduct, ProductPatch, ProductView, Unit};
use crate::errors::AppError;
use crate::state::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    /// One of `litre`, `kg`, `pcs`, `other`.
    pub unit: String,
    /// Decimal price as a string, e.g. "42.50"
    pub default_price: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub unit: Option<String>,
    pub default_price: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub unit: String,
    pub default_price: String,
}

impl From<ProductView> for ProductResponse {
    fn from(p: ProductView) -> Self {
        ProductResponse {
            id: p.id,
            name: p.name,
            unit: p.unit.to_string(),
            default_price: money(&p.default_price),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PriceIncrementRequest {
    /// Signed decimal, e.g. "2" or "-1.50"
    pub price_increment: String,
    /// Resending a request with the same id does not apply it twice.
    pub propagation_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PriceIncrementResponse {
    pub propagation_id: Uuid,
    pub product_id: Uuid,
    pub new_default_price: String,
    pub overrides_updated: i32,
    pub already_applied: bool,
}

impl From<PropagationOutcome> for PriceIncrementResponse {
    fn from(o: PropagationOutcome) -> Self {
        PriceIncrementResponse {
            propagation_id: o.propagation_id,
            product_id: o.product_id,
            new_default_price: money(&o.new_default_price),
            overrides_updated: o.overrides_updated,
            already_applied: o.already_applied,
        }
    }
}

fn parse_unit(raw: &str) -> Result<Unit, AppError> {
    Ok(raw.parse::<Unit>()?)
}

// ── Handlers ─────────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/products",
    responses(
        (status = 200, description = "All products by name", body = [ProductResponse]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "products"
)]
pub async fn list_products(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let products = run(move || state.products.list_products()).await?;
    let body: Vec<ProductResponse> = products.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    post,
    path = "/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid product"),
    ),
    tag = "products"
)]
pub async fn create_product(
    state: web::Data<AppState>,
    body: web::Json<CreateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let product = NewProduct {
        name: body.name,
        unit: parse_unit(&body.unit)?,
        default_price: parse_decimal("default_price", &body.default_price)?,
    };

    let created = run(move || state.products.create_product(product)).await?;
    Ok(HttpResponse::Created().json(ProductResponse::from(created)))
}

#[utoipa::path(
    get,
    path = "/products/{id}",
    params(("id" = Uuid, Path, description = "Product UUID")),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn get_product(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let product = run(move || state.products.get_product(id))
        .await?
        .ok_or(DomainError::NotFound("Product"))?;
    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

#[utoipa::path(
    patch,
    path = "/products/{id}",
    params(("id" = Uuid, Path, description = "Product UUID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 400, description = "Invalid patch"),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn update_product(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let body = body.into_inner();
    let patch = ProductPatch {
        name: body.name,
        unit: body.unit.as_deref().map(parse_unit).transpose()?,
        default_price: parse_optional_decimal("default_price", body.default_price.as_deref())?,
    };

    let updated = run(move || state.products.update_product(id, patch)).await?;
    Ok(HttpResponse::Ok().json(ProductResponse::from(updated)))
}

/// DELETE /products/{id}
///
/// Refused with 409 while orders or inventory entries still refer to the
/// product.
#[utoipa::path(
    delete,
    path = "/products/{id}",
    params(("id" = Uuid, Path, description = "Product UUID")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Product still in use"),
    ),
    tag = "products"
)]
pub async fn delete_product(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    run(move || state.products.delete_product(id)).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /products/{id}/price-increment
///
/// Moves the default price and every stored customer override by the same
/// amount, in one transaction.
#[utoipa::path(
    post,
    path = "/products/{id}/price-increment",
    params(("id" = Uuid, Path, description = "Product UUID")),
    request_body = PriceIncrementRequest,
    responses(
        (status = 200, description = "Increment applied (or already applied)", body = PriceIncrementResponse),
        (status = 400, description = "A resulting price would be negative"),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn increment_price(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<PriceIncrementRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let body = body.into_inner();
    let delta = parse_decimal("price_increment", &body.price_increment)?;
    let propagation_id = body.propagation_id;

    let outcome = run(move || state.products.increment_price(id, delta, propagation_id)).await?;
    Ok(HttpResponse::Ok().json(PriceIncrementResponse::from(outcome)))
}
