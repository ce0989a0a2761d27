use pushkind_common::db::{DbConnection, DbPool};
use pushkind_common::repository::errors::RepositoryResult;

use crate::domain::{
    batch::{Batch, BatchQuery, NewBatch, UpdateBatchDetails},
    permission::RolePermissionRule,
    product::{NewProduct, Product, ProductListQuery},
    store::{NewStore, Store},
    transaction::{NewStockTransaction, StockTransaction, TransactionListQuery},
    user::{NewUser, UpdateUser, User, UserListQuery},
};
use crate::errors::LedgerResult;

pub mod batch;
pub mod ledger;
pub mod product;
pub mod role_permission;
pub mod store;
pub mod transaction;
pub mod user;

#[cfg(test)]
pub mod memory;
#[cfg(test)]
pub mod mock;

#[derive(Clone)]
/// Diesel-backed repository implementation that wraps an r2d2 pool.
pub struct DieselRepository {
    pool: DbPool, // r2d2::Pool is cheap to clone
}

impl DieselRepository {
    /// Create a new repository using the provided connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(self.pool.get()?)
    }
}

/// Read-only operations over stores and their member lists.
pub trait StoreReader {
    fn get_store_by_id(&self, id: i32, hub_id: i32) -> RepositoryResult<Option<Store>>;
    fn list_stores(&self, hub_id: i32) -> RepositoryResult<Vec<Store>>;
}

pub trait StoreWriter {
    fn create_store(&self, new_store: &NewStore) -> RepositoryResult<Store>;
}

/// Read-only operations over inventory users.
pub trait UserReader {
    fn get_user_by_id(&self, id: i32, hub_id: i32) -> RepositoryResult<Option<User>>;
    fn get_user_by_email(&self, email: &str, hub_id: i32) -> RepositoryResult<Option<User>>;
    fn list_users(&self, query: UserListQuery) -> RepositoryResult<(usize, Vec<User>)>;
}

pub trait UserWriter {
    fn create_user(&self, new_user: &NewUser) -> RepositoryResult<User>;
    fn update_user(&self, user_id: i32, hub_id: i32, updates: &UpdateUser)
    -> RepositoryResult<User>;
}

/// Read-only operations over product definitions.
pub trait ProductReader {
    fn get_product_by_id(&self, id: i32, hub_id: i32) -> RepositoryResult<Option<Product>>;
    fn list_products(&self, query: ProductListQuery) -> RepositoryResult<(usize, Vec<Product>)>;
}

/// Product definitions are created here; stock and archiving go through the ledger.
pub trait ProductWriter {
    fn create_product(&self, new_product: &NewProduct) -> RepositoryResult<Product>;
}

/// Read-only batch access outside of a ledger transaction.
pub trait BatchReader {
    fn get_batch_by_id(&self, id: i32, hub_id: i32) -> RepositoryResult<Option<Batch>>;
    /// Batches matching `query` in first-expired-first-out order.
    fn list_batches(&self, query: &BatchQuery) -> RepositoryResult<Vec<Batch>>;
}

/// Read-only access to the transaction log.
pub trait TransactionReader {
    fn get_transaction_by_id(
        &self,
        id: i32,
        hub_id: i32,
    ) -> RepositoryResult<Option<StockTransaction>>;
    /// Newest first.
    fn list_transactions(
        &self,
        query: TransactionListQuery,
    ) -> RepositoryResult<(usize, Vec<StockTransaction>)>;
}

/// Centrally stored role rule overrides.
pub trait RolePermissionReader {
    fn list_role_permissions(&self) -> RepositoryResult<Vec<RolePermissionRule>>;
}

pub trait RolePermissionWriter {
    fn upsert_role_permission(
        &self,
        rule: &RolePermissionRule,
    ) -> RepositoryResult<RolePermissionRule>;
}

/// Storage operations available inside one ledger transaction.
///
/// `lock_batch` must hold the batch row (or the database) for writing until
/// the surrounding transaction ends.
pub trait LedgerSession {
    fn lock_batch(&mut self, batch_id: i32, hub_id: i32) -> RepositoryResult<Option<Batch>>;
    fn insert_batch(&mut self, new_batch: &NewBatch) -> RepositoryResult<Batch>;
    fn write_batch_quantity(&mut self, batch_id: i32, quantity: i32) -> RepositoryResult<()>;
    fn update_batch_details(
        &mut self,
        batch_id: i32,
        details: &UpdateBatchDetails,
    ) -> RepositoryResult<()>;
    fn set_batch_archived(&mut self, batch_id: i32, archived: bool) -> RepositoryResult<()>;
    /// Batches matching `query` in first-expired-first-out order.
    fn query_batches(&mut self, query: &BatchQuery) -> RepositoryResult<Vec<Batch>>;
    fn get_product(&mut self, product_id: i32, hub_id: i32) -> RepositoryResult<Option<Product>>;
    fn set_product_archived(&mut self, product_id: i32, archived: bool) -> RepositoryResult<()>;
    fn get_store(&mut self, store_id: i32, hub_id: i32) -> RepositoryResult<Option<Store>>;
    fn insert_transaction(
        &mut self,
        record: &NewStockTransaction,
    ) -> RepositoryResult<StockTransaction>;
    fn get_transaction(
        &mut self,
        transaction_id: i32,
        hub_id: i32,
    ) -> RepositoryResult<Option<StockTransaction>>;
    /// Transaction whose `linked_transaction_id` points at `transaction_id`.
    fn find_linked_transaction(
        &mut self,
        transaction_id: i32,
    ) -> RepositoryResult<Option<StockTransaction>>;
    /// Transactions `operator_id` previously wrote under `request_key`, oldest first.
    fn find_transactions_by_request_key(
        &mut self,
        hub_id: i32,
        operator_id: i32,
        request_key: &str,
    ) -> RepositoryResult<Vec<StockTransaction>>;
    /// Flip `is_undone`. Fails with `NotFound` when the row is missing or
    /// already undone.
    fn mark_transaction_undone(&mut self, transaction_id: i32) -> RepositoryResult<()>;
}

/// Runs ledger work atomically. Returning `Err` from `operation` discards
/// every write made through the session.
pub trait LedgerStore {
    fn run_in_transaction<T, F>(&self, operation: F) -> LedgerResult<T>
    where
        F: FnOnce(&mut dyn LedgerSession) -> LedgerResult<T>;
}
