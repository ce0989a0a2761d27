//! In-memory ledger storage for service tests.
//!
//! `run_in_transaction` holds one mutex for the whole operation and restores
//! a copy of the state when the operation fails.

use std::sync::{Mutex, MutexGuard};

use chrono::{Duration, NaiveDate, NaiveDateTime};
use pushkind_common::repository::errors::{RepositoryError, RepositoryResult};

use crate::domain::{
    batch::{Batch, BatchQuery, NewBatch, UpdateBatchDetails, fefo_cmp},
    product::{Product, ProductListQuery},
    store::Store,
    transaction::{NewStockTransaction, StockTransaction, TransactionListQuery},
    user::{User, UserListQuery},
};
use crate::errors::LedgerResult;
use crate::repository::{
    BatchReader, LedgerSession, LedgerStore, ProductReader, StoreReader, TransactionReader,
    UserReader,
};

#[derive(Debug, Clone, Default)]
struct LedgerState {
    stores: Vec<Store>,
    products: Vec<Product>,
    batches: Vec<Batch>,
    transactions: Vec<StockTransaction>,
    users: Vec<User>,
    next_batch_id: i32,
    next_transaction_id: i32,
    clock: i64,
    /// Fail `insert_transaction` once this many inserts succeeded.
    fail_after_inserts: Option<usize>,
    inserts: usize,
}

impl LedgerState {
    fn tick(&mut self) -> NaiveDateTime {
        self.clock += 1;
        fixtures::at(1) + Duration::seconds(self.clock)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState {
                next_batch_id: 1000,
                next_transaction_id: 1,
                ..LedgerState::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap()
    }

    pub fn add_store(&self, store: Store) {
        self.lock().stores.push(store);
    }

    pub fn add_product(&self, product: Product) {
        self.lock().products.push(product);
    }

    pub fn add_batch(&self, batch: Batch) {
        self.lock().batches.push(batch);
    }

    pub fn add_user(&self, user: User) {
        self.lock().users.push(user);
    }

    /// Hard-remove a batch row, bypassing the ledger.
    pub fn remove_batch(&self, batch_id: i32) {
        self.lock().batches.retain(|batch| batch.id != batch_id);
    }

    /// Make the (n+1)-th transaction insert fail with a storage error.
    pub fn fail_transaction_insert_after(&self, inserts: usize) {
        let mut state = self.lock();
        state.fail_after_inserts = Some(inserts);
        state.inserts = 0;
    }

    pub fn user(&self, id: i32) -> User {
        self.lock()
            .users
            .iter()
            .find(|user| user.id == id)
            .cloned()
            .expect("user fixture")
    }

    pub fn batch(&self, id: i32) -> Batch {
        self.lock()
            .batches
            .iter()
            .find(|batch| batch.id == id)
            .cloned()
            .expect("batch fixture")
    }

    pub fn batch_count(&self) -> usize {
        self.lock().batches.len()
    }

    pub fn product(&self, id: i32) -> Product {
        self.lock()
            .products
            .iter()
            .find(|product| product.id == id)
            .cloned()
            .expect("product fixture")
    }

    pub fn transaction(&self, id: i32) -> StockTransaction {
        self.lock()
            .transactions
            .iter()
            .find(|entry| entry.id == id)
            .cloned()
            .expect("transaction")
    }

    pub fn transactions(&self) -> Vec<StockTransaction> {
        self.lock().transactions.clone()
    }
}

impl LedgerStore for InMemoryLedger {
    fn run_in_transaction<T, F>(&self, operation: F) -> LedgerResult<T>
    where
        F: FnOnce(&mut dyn LedgerSession) -> LedgerResult<T>,
    {
        let mut state = self.lock();
        let backup = state.clone();

        let result = operation(&mut *state);
        if result.is_err() {
            *state = backup;
        }
        result
    }
}

fn batch_mut(state: &mut LedgerState, batch_id: i32) -> RepositoryResult<&mut Batch> {
    state
        .batches
        .iter_mut()
        .find(|batch| batch.id == batch_id)
        .ok_or(RepositoryError::NotFound)
}

impl LedgerSession for LedgerState {
    fn lock_batch(&mut self, batch_id: i32, hub_id: i32) -> RepositoryResult<Option<Batch>> {
        Ok(self
            .batches
            .iter()
            .find(|batch| batch.id == batch_id && batch.hub_id == hub_id)
            .cloned())
    }

    fn insert_batch(&mut self, new_batch: &NewBatch) -> RepositoryResult<Batch> {
        let now = self.tick();
        let batch = Batch {
            id: self.next_batch_id,
            hub_id: new_batch.hub_id,
            product_id: new_batch.product_id,
            store_id: new_batch.store_id,
            batch_number: new_batch.batch_number.clone(),
            quantity: 0,
            expiry_date: new_batch.expiry_date,
            is_archived: false,
            created_at: now,
            updated_at: now,
        };
        self.next_batch_id += 1;
        self.batches.push(batch.clone());
        Ok(batch)
    }

    fn write_batch_quantity(&mut self, batch_id: i32, quantity: i32) -> RepositoryResult<()> {
        let now = self.tick();
        let batch = batch_mut(self, batch_id)?;
        batch.quantity = quantity;
        batch.updated_at = now;
        Ok(())
    }

    fn update_batch_details(
        &mut self,
        batch_id: i32,
        details: &UpdateBatchDetails,
    ) -> RepositoryResult<()> {
        let batch = batch_mut(self, batch_id)?;
        if let Some(batch_number) = &details.batch_number {
            batch.batch_number = batch_number.clone();
        }
        if let Some(expiry_date) = details.expiry_date {
            batch.expiry_date = expiry_date;
        }
        Ok(())
    }

    fn set_batch_archived(&mut self, batch_id: i32, archived: bool) -> RepositoryResult<()> {
        batch_mut(self, batch_id)?.is_archived = archived;
        Ok(())
    }

    fn query_batches(&mut self, query: &BatchQuery) -> RepositoryResult<Vec<Batch>> {
        let mut batches: Vec<Batch> = self
            .batches
            .iter()
            .filter(|batch| query.matches(batch))
            .cloned()
            .collect();
        batches.sort_by(fefo_cmp);
        Ok(batches)
    }

    fn get_product(&mut self, product_id: i32, hub_id: i32) -> RepositoryResult<Option<Product>> {
        Ok(self
            .products
            .iter()
            .find(|product| product.id == product_id && product.hub_id == hub_id)
            .cloned())
    }

    fn set_product_archived(&mut self, product_id: i32, archived: bool) -> RepositoryResult<()> {
        let product = self
            .products
            .iter_mut()
            .find(|product| product.id == product_id)
            .ok_or(RepositoryError::NotFound)?;
        product.is_archived = archived;
        Ok(())
    }

    fn get_store(&mut self, store_id: i32, hub_id: i32) -> RepositoryResult<Option<Store>> {
        Ok(self
            .stores
            .iter()
            .find(|store| store.id == store_id && store.hub_id == hub_id)
            .cloned())
    }

    fn insert_transaction(
        &mut self,
        record: &NewStockTransaction,
    ) -> RepositoryResult<StockTransaction> {
        if self
            .fail_after_inserts
            .is_some_and(|limit| self.inserts >= limit)
        {
            return Err(RepositoryError::from(
                diesel::result::Error::BrokenTransactionManager,
            ));
        }
        self.inserts += 1;

        let timestamp = self.tick();
        let entry = StockTransaction {
            id: self.next_transaction_id,
            hub_id: record.hub_id,
            kind: record.kind,
            product_id: record.product_id,
            store_id: record.store_id,
            batch_id: record.batch_id,
            quantity: record.quantity,
            balance_after: record.balance_after,
            timestamp,
            operator: record.operator.clone(),
            note: record.note.clone(),
            snapshot: record.snapshot.clone(),
            linked_transaction_id: record.linked_transaction_id,
            request_key: record.request_key.clone(),
            is_undone: false,
        };
        self.next_transaction_id += 1;
        self.transactions.push(entry.clone());
        Ok(entry)
    }

    fn get_transaction(
        &mut self,
        transaction_id: i32,
        hub_id: i32,
    ) -> RepositoryResult<Option<StockTransaction>> {
        Ok(self
            .transactions
            .iter()
            .find(|entry| entry.id == transaction_id && entry.hub_id == hub_id)
            .cloned())
    }

    fn find_linked_transaction(
        &mut self,
        transaction_id: i32,
    ) -> RepositoryResult<Option<StockTransaction>> {
        Ok(self
            .transactions
            .iter()
            .find(|entry| entry.linked_transaction_id == Some(transaction_id))
            .cloned())
    }

    fn find_transactions_by_request_key(
        &mut self,
        hub_id: i32,
        operator_id: i32,
        request_key: &str,
    ) -> RepositoryResult<Vec<StockTransaction>> {
        Ok(self
            .transactions
            .iter()
            .filter(|entry| {
                entry.hub_id == hub_id
                    && entry.operator.id == operator_id
                    && entry.request_key.as_deref() == Some(request_key)
            })
            .cloned()
            .collect())
    }

    fn mark_transaction_undone(&mut self, transaction_id: i32) -> RepositoryResult<()> {
        let entry = self
            .transactions
            .iter_mut()
            .find(|entry| entry.id == transaction_id && !entry.is_undone)
            .ok_or(RepositoryError::NotFound)?;
        entry.is_undone = true;
        Ok(())
    }
}

impl TransactionReader for InMemoryLedger {
    fn get_transaction_by_id(
        &self,
        id: i32,
        hub_id: i32,
    ) -> RepositoryResult<Option<StockTransaction>> {
        self.lock().get_transaction(id, hub_id)
    }

    fn list_transactions(
        &self,
        query: TransactionListQuery,
    ) -> RepositoryResult<(usize, Vec<StockTransaction>)> {
        let state = self.lock();
        let mut items: Vec<StockTransaction> = state
            .transactions
            .iter()
            .filter(|entry| entry.hub_id == query.hub_id)
            .filter(|entry| {
                query
                    .store_ids
                    .as_ref()
                    .is_none_or(|ids| ids.contains(&entry.store_id))
            })
            .filter(|entry| {
                query
                    .operator_ids
                    .as_ref()
                    .is_none_or(|ids| ids.contains(&entry.operator.id))
            })
            .filter(|entry| query.product_id.is_none_or(|id| entry.product_id == id))
            .filter(|entry| query.batch_id.is_none_or(|id| entry.batch_id == id))
            .filter(|entry| query.include_undone || !entry.is_undone)
            .cloned()
            .collect();
        items.reverse();

        let total = items.len();
        if let Some(pagination) = &query.pagination {
            let offset = (pagination.page.max(1) - 1) * pagination.per_page;
            items = items.into_iter().skip(offset).take(pagination.per_page).collect();
        }
        Ok((total, items))
    }
}

impl UserReader for InMemoryLedger {
    fn get_user_by_id(&self, id: i32, hub_id: i32) -> RepositoryResult<Option<User>> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|user| user.id == id && user.hub_id == hub_id)
            .cloned())
    }

    fn get_user_by_email(&self, email: &str, hub_id: i32) -> RepositoryResult<Option<User>> {
        let email = email.to_lowercase();
        Ok(self
            .lock()
            .users
            .iter()
            .find(|user| user.email == email && user.hub_id == hub_id)
            .cloned())
    }

    fn list_users(&self, query: UserListQuery) -> RepositoryResult<(usize, Vec<User>)> {
        let users: Vec<User> = self
            .lock()
            .users
            .iter()
            .filter(|user| user.hub_id == query.hub_id)
            .filter(|user| query.min_role_level.is_none_or(|level| user.role_level >= level))
            .cloned()
            .collect();
        Ok((users.len(), users))
    }
}

impl StoreReader for InMemoryLedger {
    fn get_store_by_id(&self, id: i32, hub_id: i32) -> RepositoryResult<Option<Store>> {
        self.lock().get_store(id, hub_id)
    }

    fn list_stores(&self, hub_id: i32) -> RepositoryResult<Vec<Store>> {
        Ok(self
            .lock()
            .stores
            .iter()
            .filter(|store| store.hub_id == hub_id)
            .cloned()
            .collect())
    }
}

impl ProductReader for InMemoryLedger {
    fn get_product_by_id(&self, id: i32, hub_id: i32) -> RepositoryResult<Option<Product>> {
        self.lock().get_product(id, hub_id)
    }

    fn list_products(&self, query: ProductListQuery) -> RepositoryResult<(usize, Vec<Product>)> {
        let mut products: Vec<Product> = self
            .lock()
            .products
            .iter()
            .filter(|product| product.hub_id == query.hub_id)
            .filter(|product| query.include_archived || !product.is_archived)
            .filter(|product| {
                query
                    .search
                    .as_ref()
                    .is_none_or(|term| product.name.contains(term.as_str()))
            })
            .cloned()
            .collect();
        products.sort_by_key(|product| product.id);
        Ok((products.len(), products))
    }
}

impl BatchReader for InMemoryLedger {
    fn get_batch_by_id(&self, id: i32, hub_id: i32) -> RepositoryResult<Option<Batch>> {
        self.lock().lock_batch(id, hub_id)
    }

    fn list_batches(&self, query: &BatchQuery) -> RepositoryResult<Vec<Batch>> {
        self.lock().query_batches(query)
    }
}

/// Rows for seeding an [`InMemoryLedger`]. Everything lives in hub 1.
pub mod fixtures {
    use super::*;

    pub fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 12, day)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .expect("valid fixture date")
    }

    pub fn store(id: i32, parent_id: Option<i32>) -> Store {
        Store {
            id,
            hub_id: 1,
            parent_id,
            name: format!("Store {id}"),
            managers: Vec::new(),
            viewers: Vec::new(),
            is_archived: false,
            created_at: at(1),
            updated_at: at(1),
        }
    }

    pub fn product(id: i32, bound_store_id: Option<i32>) -> Product {
        Product {
            id,
            hub_id: 1,
            name: format!("Product {id}"),
            sku: None,
            category: None,
            unit_name: "pcs".to_string(),
            split_unit_name: "pcs".to_string(),
            split_ratio: 1,
            min_stock_level: 0,
            bound_store_id,
            is_archived: false,
            created_at: at(1),
            updated_at: at(1),
        }
    }

    /// `expiry` is `YYYY-MM-DD`; `created_day` is a day of December 2023.
    pub fn batch(
        id: i32,
        product_id: i32,
        store_id: i32,
        quantity: i32,
        expiry: Option<&str>,
        created_day: u32,
    ) -> Batch {
        Batch {
            id,
            hub_id: 1,
            product_id,
            store_id,
            batch_number: format!("LOT-{id}"),
            quantity,
            expiry_date: expiry.map(|value| {
                NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("valid expiry fixture")
            }),
            is_archived: false,
            created_at: at(created_day),
            updated_at: at(created_day),
        }
    }

    pub fn user(id: i32, role_level: i32, allowed_store_ids: Vec<i32>) -> User {
        User {
            id,
            hub_id: 1,
            name: format!("User {id}"),
            email: format!("user{id}@example.com"),
            role_level,
            allowed_store_ids,
        }
    }
}
