use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}

/// Lines a shopper collected before logging in.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MergeCartRequest {
    pub items: Vec<AddToCartRequest>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: i64,
    pub quantity: i32,
    pub available: i32,
    pub weight_kg: f64,
    pub line_total: i64,
    pub image: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartSummary {
    pub items: Vec<CartLine>,
    pub subtotal: i64,
    pub total_weight_kg: f64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SkippedLine {
    pub product_id: Uuid,
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MergeResult {
    pub cart: CartSummary,
    pub skipped: Vec<SkippedLine>,
}
