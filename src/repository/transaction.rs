use diesel::prelude::*;
use pushkind_common::repository::errors::RepositoryResult;

use crate::{
    domain::transaction::{StockTransaction as DomainTransaction, TransactionListQuery},
    models::transaction::StockTransaction as DbTransaction,
    repository::{DieselRepository, TransactionReader},
};

impl TransactionReader for DieselRepository {
    fn get_transaction_by_id(
        &self,
        id: i32,
        hub_id: i32,
    ) -> RepositoryResult<Option<DomainTransaction>> {
        use crate::schema::stock_transactions;

        let mut conn = self.conn()?;
        let row = stock_transactions::table
            .filter(stock_transactions::id.eq(id))
            .filter(stock_transactions::hub_id.eq(hub_id))
            .first::<DbTransaction>(&mut conn)
            .optional()?;

        match row {
            Some(row) => Ok(Some(DomainTransaction::try_from(row)?)),
            None => Ok(None),
        }
    }

    fn list_transactions(
        &self,
        query: TransactionListQuery,
    ) -> RepositoryResult<(usize, Vec<DomainTransaction>)> {
        use crate::schema::stock_transactions;

        let mut conn = self.conn()?;

        let build = || {
            let mut items = stock_transactions::table
                .filter(stock_transactions::hub_id.eq(query.hub_id))
                .into_boxed::<diesel::sqlite::Sqlite>();

            if let Some(store_ids) = query.store_ids.as_ref() {
                items = items.filter(stock_transactions::store_id.eq_any(store_ids.clone()));
            }
            if let Some(operator_ids) = query.operator_ids.as_ref() {
                items = items.filter(stock_transactions::operator_id.eq_any(operator_ids.clone()));
            }
            if let Some(product_id) = query.product_id {
                items = items.filter(stock_transactions::product_id.eq(product_id));
            }
            if let Some(batch_id) = query.batch_id {
                items = items.filter(stock_transactions::batch_id.eq(batch_id));
            }
            if !query.include_undone {
                items = items.filter(stock_transactions::is_undone.eq(false));
            }
            items
        };

        let total = build().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = build().order((
            stock_transactions::created_at.desc(),
            stock_transactions::id.desc(),
        ));

        if let Some(pagination) = &query.pagination {
            let offset = ((pagination.page.max(1) - 1) * pagination.per_page) as i64;
            let limit = pagination.per_page as i64;
            items = items.offset(offset).limit(limit);
        }

        let rows = items.load::<DbTransaction>(&mut conn)?;

        let mut transactions = Vec::with_capacity(rows.len());
        for row in rows {
            transactions.push(DomainTransaction::try_from(row)?);
        }

        Ok((total, transactions))
    }
}
