use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Brand, Category, Compatibility, Product};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    #[serde(default)]
    pub cost_price: i64,
    #[serde(default)]
    pub quantity: i32,
    pub weight_kg: f64,
    pub brand_id: Option<i32>,
    pub category_id: Option<i32>,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub cost_price: Option<i64>,
    pub quantity: Option<i32>,
    pub weight_kg: Option<f64>,
    pub brand_id: Option<i32>,
    pub category_id: Option<i32>,
    pub images: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductDetail {
    pub product: Product,
    pub brand: Option<Brand>,
    pub category: Option<Category>,
    pub compatibility: Vec<Compatibility>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NameRequest {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BrandList {
    pub items: Vec<Brand>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryList {
    pub items: Vec<Category>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InventoryAdjustRequest {
    /// Signed change applied to the stock on hand.
    pub delta: i32,
    pub reason: Option<String>,
}
