use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Employee,
    Customer,
}

impl Role {
    pub fn id(self) -> i32 {
        match self {
            Role::Admin => 1,
            Role::Employee => 2,
            Role::Customer => 3,
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Employee),
            3 => Some(Role::Customer),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employee => "employee",
            Role::Customer => "customer",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Role::Admin),
            "employee" => Some(Role::Employee),
            "customer" => Some(Role::Customer),
            _ => None,
        }
    }

    pub fn is_staff(self) -> bool {
        matches!(self, Role::Admin | Role::Employee)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Brand {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    /// Only present on staff views.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_price: Option<i64>,
    pub quantity: i32,
    pub weight_kg: f64,
    pub brand_id: Option<i32>,
    pub category_id: Option<i32>,
    pub images: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CarMake {
    pub id: i32,
    pub make: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CarModel {
    pub id: i32,
    pub car_id: i32,
    pub base_model: String,
    pub variant: Option<String>,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Compatibility {
    pub id: i32,
    pub car_model_id: i32,
    pub make: String,
    pub base_model: String,
    pub variant: Option<String>,
    pub year_from: i32,
    pub year_to: i32,
}

/// Any level of the region > province > municipality > barangay tree.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Location {
    pub id: i32,
    pub parent_id: Option<i32>,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Address {
    pub id: Uuid,
    pub recipient_name: String,
    pub phone: String,
    pub street: String,
    pub barangay_id: i32,
    pub is_default: bool,
    pub full_address: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApprovedAddress {
    pub id: i32,
    pub label: String,
    pub street: String,
    pub barangay_id: i32,
    pub is_active: bool,
    pub full_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Courier {
    pub id: i32,
    pub name: String,
    pub base_rate: i64,
    pub rate_per_kg: i64,
    pub max_weight_kg: f64,
    pub is_active: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct DeliveryStatus {
    pub id: i32,
    pub name: String,
}

/// A sale together with the current state of its delivery.
#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub customer_email: String,
    pub subtotal: i64,
    pub shipping_fee: i64,
    pub total_amount: i64,
    pub payment_method: String,
    pub status_id: i32,
    pub status: String,
    pub tracking_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct SaleItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub line_total: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Delivery {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub courier_id: i32,
    pub shipping_address: String,
    pub fee: i64,
    pub status_id: i32,
    pub status: String,
    pub tracking_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct DeliveryHistoryEntry {
    pub id: Uuid,
    pub status_id: i32,
    pub status: String,
    pub tracking_number: Option<String>,
    pub note: Option<String>,
    pub changed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Supplier {
    pub id: i32,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Supply {
    pub id: Uuid,
    pub receipt_number: String,
    pub supplier_id: i32,
    pub total_cost: i64,
    pub received_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct SupplyLine {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_cost: i64,
}

#[cfg(test)]
mod tests {
    use super::Role;

    #[test]
    fn role_ids_round_trip() {
        for role in [Role::Admin, Role::Employee, Role::Customer] {
            assert_eq!(Role::from_id(role.id()), Some(role));
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::from_id(9), None);
        assert!(Role::Employee.is_staff());
        assert!(!Role::Customer.is_staff());
    }
}
