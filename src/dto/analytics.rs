use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct DailySales {
    pub day: NaiveDate,
    pub orders: i64,
    pub revenue: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct TopProduct {
    pub product_id: Uuid,
    pub name: String,
    pub units: i64,
    pub revenue: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SalesSummary {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub orders: i64,
    pub units_sold: i64,
    pub subtotal: i64,
    pub shipping: i64,
    pub total: i64,
    pub daily: Vec<DailySales>,
    pub top_products: Vec<TopProduct>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct SupplierTotal {
    pub supplier_id: i32,
    pub name: String,
    pub receipts: i64,
    pub total_cost: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SupplySummary {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub receipts: i64,
    pub total_cost: i64,
    pub by_supplier: Vec<SupplierTotal>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct DashboardCounts {
    pub products: i64,
    pub low_stock: i64,
    pub pending_deliveries: i64,
    pub customers: i64,
}
