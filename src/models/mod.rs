pub mod batch;
pub mod product;
pub mod role_permission;
pub mod store;
pub mod transaction;
pub mod user;
