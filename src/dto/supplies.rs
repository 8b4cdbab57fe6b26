use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Supplier, Supply, SupplyLine};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSupplierRequest {
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// A product that enters the catalog with its first delivery.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewSupplyProduct {
    pub name: String,
    pub description: Option<String>,
    pub brand_name: Option<String>,
    pub category_name: Option<String>,
    pub price: i64,
    pub weight_kg: f64,
}

/// Either `product_id` or `new_product` must be given.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SupplyLineRequest {
    pub product_id: Option<Uuid>,
    pub new_product: Option<NewSupplyProduct>,
    pub quantity: i32,
    pub unit_cost: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSupplyRequest {
    pub receipt_number: String,
    pub supplier_id: i32,
    pub received_at: Option<DateTime<Utc>>,
    pub lines: Vec<SupplyLineRequest>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SupplierList {
    pub items: Vec<Supplier>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SupplyList {
    pub items: Vec<Supply>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SupplyDetail {
    pub supply: Supply,
    pub supplier: Supplier,
    pub lines: Vec<SupplyLine>,
}
