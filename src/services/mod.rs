pub use pushkind_common::services::errors::{ServiceError, ServiceResult};

pub mod actors;
pub mod allocation;
pub mod ledger;
pub mod permissions;
pub mod scoping;
pub mod stock;
pub mod transactions;
pub mod transfer;
pub mod undo;
