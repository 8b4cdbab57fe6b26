use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Address, ApprovedAddress, Location};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAddressRequest {
    pub recipient_name: String,
    pub phone: String,
    pub street: String,
    pub barangay_id: i32,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateApprovedAddressRequest {
    pub label: String,
    pub street: String,
    pub barangay_id: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LocationList {
    pub items: Vec<Location>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddressList {
    pub items: Vec<Address>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApprovedAddressList {
    pub items: Vec<ApprovedAddress>,
}
