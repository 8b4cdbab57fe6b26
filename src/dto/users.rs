use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::User;

/// Staff accounts are employees unless `role` says `admin`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateStaffRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeRoleRequest {
    pub role: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserList {
    pub items: Vec<User>,
}
