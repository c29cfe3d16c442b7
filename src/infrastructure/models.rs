use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::{
    customer_default_products, customers, inventory_entries, inventory_items, order_lines, orders,
    payments, price_propagations, products,
};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub unit: String,
    pub default_price: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = products)]
pub struct NewProductRow {
    pub id: Uuid,
    pub name: String,
    pub unit: String,
    pub default_price: BigDecimal,
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = products)]
pub struct ProductChangeset {
    pub name: Option<String>,
    pub unit: Option<String>,
    pub default_price: Option<BigDecimal>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = customers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CustomerRow {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub opening_balance: BigDecimal,
    pub outstanding_amount: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = customers)]
pub struct NewCustomerRow {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub opening_balance: BigDecimal,
    pub outstanding_amount: BigDecimal,
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = customers)]
pub struct CustomerChangeset {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub opening_balance: Option<BigDecimal>,
    pub outstanding_amount: Option<BigDecimal>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations, Insertable)]
#[diesel(table_name = customer_default_products)]
#[diesel(primary_key(customer_id, product_id))]
#[diesel(belongs_to(CustomerRow, foreign_key = customer_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DefaultProductRow {
    pub customer_id: Uuid,
    pub product_id: Uuid,
    pub position: i32,
    pub custom_price: Option<BigDecimal>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub date: DateTime<Utc>,
    pub billed_by: Option<String>,
    pub is_return: bool,
    pub bill: BigDecimal,
    pub paid: BigDecimal,
    pub outstanding_at_time: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub date: DateTime<Utc>,
    pub billed_by: Option<String>,
    pub is_return: bool,
    pub bill: BigDecimal,
    pub paid: BigDecimal,
    pub outstanding_at_time: BigDecimal,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_lines)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderLineRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub position: i32,
    pub rate_at_purchase: BigDecimal,
    pub quantity: BigDecimal,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_lines)]
pub struct NewOrderLineRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub position: i32,
    pub rate_at_purchase: BigDecimal,
    pub quantity: BigDecimal,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PaymentRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub date: DateTime<Utc>,
    pub amount: BigDecimal,
    pub mode_of_payment: String,
    pub paid_to: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = payments)]
pub struct NewPaymentRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub date: DateTime<Utc>,
    pub amount: BigDecimal,
    pub mode_of_payment: String,
    pub paid_to: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = inventory_entries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct InventoryEntryRow {
    pub id: Uuid,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations, Insertable)]
#[diesel(table_name = inventory_items)]
#[diesel(belongs_to(InventoryEntryRow, foreign_key = entry_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct InventoryItemRow {
    pub id: Uuid,
    pub entry_id: Uuid,
    pub product_id: Uuid,
    pub position: i32,
    pub quantity: BigDecimal,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = price_propagations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PricePropagationRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub price_increment: BigDecimal,
    pub new_default_price: BigDecimal,
    pub overrides_updated: i32,
}
