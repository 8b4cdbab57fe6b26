pub mod addresses;
pub mod analytics;
pub mod auth;
pub mod cart;
pub mod compatibility;
pub mod couriers;
pub mod orders;
pub mod products;
pub mod supplies;
pub mod users;
