use diesel::prelude::*;
use diesel::sqlite::{Sqlite, SqliteConnection};
use pushkind_common::repository::errors::RepositoryResult;

use crate::{
    domain::batch::{Batch as DomainBatch, BatchQuery},
    models::batch::Batch as DbBatch,
    repository::{BatchReader, DieselRepository},
};

impl BatchReader for DieselRepository {
    fn get_batch_by_id(&self, id: i32, hub_id: i32) -> RepositoryResult<Option<DomainBatch>> {
        use crate::schema::batches;

        let mut conn = self.conn()?;
        let batch = batches::table
            .filter(batches::id.eq(id))
            .filter(batches::hub_id.eq(hub_id))
            .first::<DbBatch>(&mut conn)
            .optional()?;

        Ok(batch.map(Into::into))
    }

    fn list_batches(&self, query: &BatchQuery) -> RepositoryResult<Vec<DomainBatch>> {
        let mut conn = self.conn()?;
        load_batches(&mut conn, query)
    }
}

/// Load batches in first-expired-first-out order: expiry ascending with
/// undated batches last, then creation time, then id.
pub(crate) fn load_batches(
    conn: &mut SqliteConnection,
    query: &BatchQuery,
) -> RepositoryResult<Vec<DomainBatch>> {
    use crate::schema::batches;

    let mut items = batches::table
        .filter(batches::hub_id.eq(query.hub_id))
        .into_boxed::<Sqlite>();

    if let Some(product_id) = query.product_id {
        items = items.filter(batches::product_id.eq(product_id));
    }

    if let Some(store_ids) = query.store_ids.as_ref() {
        items = items.filter(batches::store_id.eq_any(store_ids.clone()));
    }

    if !query.include_archived {
        items = items.filter(batches::is_archived.eq(false));
    }

    if query.in_stock_only {
        items = items.filter(batches::quantity.gt(0));
    }

    let rows = items
        .order((
            batches::expiry_date.is_null().asc(),
            batches::expiry_date.asc(),
            batches::created_at.asc(),
            batches::id.asc(),
        ))
        .load::<DbBatch>(conn)?;

    Ok(rows.into_iter().map(DomainBatch::from).collect())
}
