use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Courier;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCourierRequest {
    pub name: String,
    pub base_rate: i64,
    pub rate_per_kg: i64,
    pub max_weight_kg: f64,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateCourierRequest {
    pub name: Option<String>,
    pub base_rate: Option<i64>,
    pub rate_per_kg: Option<i64>,
    pub max_weight_kg: Option<f64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CourierList {
    pub items: Vec<Courier>,
}

/// `fee` is absent when the parcel is too heavy for the courier.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CourierQuote {
    pub courier: Courier,
    pub capable: bool,
    pub fee: Option<i64>,
    pub total: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ShippingQuote {
    pub total_weight_kg: f64,
    pub subtotal: i64,
    pub quotes: Vec<CourierQuote>,
}
