pub mod config;
pub mod domain;
pub mod errors;
pub mod forms;
pub mod models;
pub mod repository;
pub mod routes;
pub mod schema;
pub mod services;

/// Role an authenticated principal needs to use the inventory service.
pub const SERVICE_ACCESS_ROLE: &str = "inventory";
