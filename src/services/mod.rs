pub mod address_service;
pub mod admin_service;
pub mod analytics_service;
pub mod auth_service;
pub mod cart_service;
pub mod compatibility_service;
pub mod courier_service;
pub mod order_service;
pub mod product_service;
pub mod supply_service;
pub mod user_service;
