pub mod audit;
pub mod car_model_name;
pub mod config;
pub mod db;
pub mod delivery_status;
pub mod dto;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod models;
pub mod money;
pub mod password;
pub mod response;
pub mod routes;
pub mod services;
pub mod shipping;
pub mod state;
