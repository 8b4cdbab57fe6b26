use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{CarMake, CarModel, Compatibility};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMakeRequest {
    pub make: String,
}

/// Either `base_model` (with optional `variant`) or a free-text `name`
/// that is split into the two.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateModelRequest {
    pub name: Option<String>,
    pub base_model: Option<String>,
    pub variant: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CompatibilityEntry {
    pub car_model_id: i32,
    pub year_from: i32,
    pub year_to: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetCompatibilityRequest {
    pub entries: Vec<CompatibilityEntry>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MakeList {
    pub items: Vec<CarMake>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ModelList {
    pub items: Vec<CarModel>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CompatibilityList {
    pub items: Vec<Compatibility>,
}
