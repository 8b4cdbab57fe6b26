use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Delivery, DeliveryHistoryEntry, DeliveryStatus, Order, SaleItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cod,
    Gcash,
    BankTransfer,
}

impl PaymentMethod {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cod" => Some(PaymentMethod::Cod),
            "gcash" => Some(PaymentMethod::Gcash),
            "bank_transfer" => Some(PaymentMethod::BankTransfer),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cod => "cod",
            PaymentMethod::Gcash => "gcash",
            PaymentMethod::BankTransfer => "bank_transfer",
        }
    }
}

/// Exactly one of `address_id` and `approved_address_id` must be set.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub courier_id: i32,
    pub address_id: Option<Uuid>,
    pub approved_address_id: Option<i32>,
    pub payment_method: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status_id: i32,
    pub tracking_number: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CancelOrderRequest {
    pub note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<SaleItem>,
    pub delivery: Delivery,
    pub history: Vec<DeliveryHistoryEntry>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeliveryStatusList {
    pub items: Vec<DeliveryStatus>,
}
