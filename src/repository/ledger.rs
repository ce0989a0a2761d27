use chrono::Local;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use pushkind_common::repository::errors::{RepositoryError, RepositoryResult};

use crate::{
    domain::{
        batch::{Batch as DomainBatch, BatchQuery, NewBatch, UpdateBatchDetails},
        product::Product as DomainProduct,
        store::Store as DomainStore,
        transaction::{NewStockTransaction, StockTransaction as DomainTransaction},
    },
    errors::{LedgerError, LedgerResult},
    models::{
        batch::{Batch as DbBatch, NewBatch as DbNewBatch, UpdateBatchDetails as DbBatchDetails},
        product::Product as DbProduct,
        transaction::{NewStockTransaction as DbNewTransaction, StockTransaction as DbTransaction},
    },
    repository::{
        DieselRepository, LedgerSession, LedgerStore, batch::load_batches, store::load_store,
    },
};

impl LedgerStore for DieselRepository {
    /// Runs `operation` inside `BEGIN IMMEDIATE`, so the database write lock is
    /// held from the first batch read until commit or rollback.
    fn run_in_transaction<T, F>(&self, operation: F) -> LedgerResult<T>
    where
        F: FnOnce(&mut dyn LedgerSession) -> LedgerResult<T>,
    {
        let mut conn = self.conn()?;

        conn.immediate_transaction::<T, LedgerError, _>(|conn| {
            let mut session = DieselLedgerSession { conn };
            operation(&mut session)
        })
    }
}

/// Ledger session bound to one open SQLite transaction.
pub struct DieselLedgerSession<'a> {
    conn: &'a mut SqliteConnection,
}

impl DieselLedgerSession<'_> {
    fn conn(&mut self) -> &mut SqliteConnection {
        self.conn
    }
}

impl LedgerSession for DieselLedgerSession<'_> {
    fn lock_batch(&mut self, batch_id: i32, hub_id: i32) -> RepositoryResult<Option<DomainBatch>> {
        use crate::schema::batches;

        // The immediate transaction already holds the write lock; SQLite has
        // no per-row FOR UPDATE.
        let batch = batches::table
            .filter(batches::id.eq(batch_id))
            .filter(batches::hub_id.eq(hub_id))
            .first::<DbBatch>(self.conn())
            .optional()?;

        Ok(batch.map(Into::into))
    }

    fn insert_batch(&mut self, new_batch: &NewBatch) -> RepositoryResult<DomainBatch> {
        use crate::schema::batches;

        let created = diesel::insert_into(batches::table)
            .values(DbNewBatch::from(new_batch))
            .get_result::<DbBatch>(self.conn())?;

        Ok(created.into())
    }

    fn write_batch_quantity(&mut self, batch_id: i32, quantity: i32) -> RepositoryResult<()> {
        use crate::schema::batches;

        let updated = diesel::update(batches::table.filter(batches::id.eq(batch_id)))
            .set((
                batches::quantity.eq(quantity),
                batches::updated_at.eq(Local::now().naive_utc()),
            ))
            .execute(self.conn())?;

        if updated == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn update_batch_details(
        &mut self,
        batch_id: i32,
        details: &UpdateBatchDetails,
    ) -> RepositoryResult<()> {
        use crate::schema::batches;

        if details.is_empty() {
            return Ok(());
        }

        let changes = DbBatchDetails::new(details, Local::now().naive_utc());
        let updated = diesel::update(batches::table.filter(batches::id.eq(batch_id)))
            .set(&changes)
            .execute(self.conn())?;

        if updated == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn set_batch_archived(&mut self, batch_id: i32, archived: bool) -> RepositoryResult<()> {
        use crate::schema::batches;

        let updated = diesel::update(batches::table.filter(batches::id.eq(batch_id)))
            .set((
                batches::is_archived.eq(archived),
                batches::updated_at.eq(Local::now().naive_utc()),
            ))
            .execute(self.conn())?;

        if updated == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn query_batches(&mut self, query: &BatchQuery) -> RepositoryResult<Vec<DomainBatch>> {
        load_batches(self.conn(), query)
    }

    fn get_product(
        &mut self,
        product_id: i32,
        hub_id: i32,
    ) -> RepositoryResult<Option<DomainProduct>> {
        use crate::schema::products;

        let product = products::table
            .filter(products::id.eq(product_id))
            .filter(products::hub_id.eq(hub_id))
            .first::<DbProduct>(self.conn())
            .optional()?;

        Ok(product.map(Into::into))
    }

    fn set_product_archived(&mut self, product_id: i32, archived: bool) -> RepositoryResult<()> {
        use crate::schema::products;

        let updated = diesel::update(products::table.filter(products::id.eq(product_id)))
            .set((
                products::is_archived.eq(archived),
                products::updated_at.eq(Local::now().naive_utc()),
            ))
            .execute(self.conn())?;

        if updated == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn get_store(&mut self, store_id: i32, hub_id: i32) -> RepositoryResult<Option<DomainStore>> {
        load_store(self.conn(), store_id, hub_id)
    }

    fn insert_transaction(
        &mut self,
        record: &NewStockTransaction,
    ) -> RepositoryResult<DomainTransaction> {
        use crate::schema::stock_transactions;

        let row = DbNewTransaction::new(record, Local::now().naive_utc())?;
        let created = diesel::insert_into(stock_transactions::table)
            .values(&row)
            .get_result::<DbTransaction>(self.conn())?;

        Ok(DomainTransaction::try_from(created)?)
    }

    fn get_transaction(
        &mut self,
        transaction_id: i32,
        hub_id: i32,
    ) -> RepositoryResult<Option<DomainTransaction>> {
        use crate::schema::stock_transactions;

        let row = stock_transactions::table
            .filter(stock_transactions::id.eq(transaction_id))
            .filter(stock_transactions::hub_id.eq(hub_id))
            .first::<DbTransaction>(self.conn())
            .optional()?;

        match row {
            Some(row) => Ok(Some(DomainTransaction::try_from(row)?)),
            None => Ok(None),
        }
    }

    fn find_linked_transaction(
        &mut self,
        transaction_id: i32,
    ) -> RepositoryResult<Option<DomainTransaction>> {
        use crate::schema::stock_transactions;

        let row = stock_transactions::table
            .filter(stock_transactions::linked_transaction_id.eq(transaction_id))
            .first::<DbTransaction>(self.conn())
            .optional()?;

        match row {
            Some(row) => Ok(Some(DomainTransaction::try_from(row)?)),
            None => Ok(None),
        }
    }

    fn find_transactions_by_request_key(
        &mut self,
        hub_id: i32,
        operator_id: i32,
        request_key: &str,
    ) -> RepositoryResult<Vec<DomainTransaction>> {
        use crate::schema::stock_transactions;

        let rows = stock_transactions::table
            .filter(stock_transactions::hub_id.eq(hub_id))
            .filter(stock_transactions::operator_id.eq(operator_id))
            .filter(stock_transactions::request_key.eq(request_key))
            .order(stock_transactions::id.asc())
            .load::<DbTransaction>(self.conn())?;

        let mut transactions = Vec::with_capacity(rows.len());
        for row in rows {
            transactions.push(DomainTransaction::try_from(row)?);
        }
        Ok(transactions)
    }

    fn mark_transaction_undone(&mut self, transaction_id: i32) -> RepositoryResult<()> {
        use crate::schema::stock_transactions;

        let target = stock_transactions::table
            .filter(stock_transactions::id.eq(transaction_id))
            .filter(stock_transactions::is_undone.eq(false));

        let updated = diesel::update(target)
            .set(stock_transactions::is_undone.eq(true))
            .execute(self.conn())?;

        if updated == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
