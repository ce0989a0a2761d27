pub mod batch;
pub mod permission;
pub mod product;
pub mod store;
pub mod transaction;
pub mod units;
pub mod user;
