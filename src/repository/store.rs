use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use pushkind_common::repository::errors::RepositoryResult;

use crate::domain::store::{NewStore as DomainNewStore, Store as DomainStore};
use crate::models::store::{NewStore as DbNewStore, Store as DbStore, StoreMember};
use crate::repository::{DieselRepository, StoreReader, StoreWriter};

impl StoreReader for DieselRepository {
    fn get_store_by_id(&self, id: i32, hub_id: i32) -> RepositoryResult<Option<DomainStore>> {
        let mut conn = self.conn()?;
        load_store(&mut conn, id, hub_id)
    }

    fn list_stores(&self, hub_id: i32) -> RepositoryResult<Vec<DomainStore>> {
        use crate::schema::stores;

        let mut conn = self.conn()?;

        let db_stores = stores::table
            .filter(stores::hub_id.eq(hub_id))
            .filter(stores::is_archived.eq(false))
            .order((stores::parent_id.asc(), stores::name.asc()))
            .load::<DbStore>(&mut conn)?;

        if db_stores.is_empty() {
            return Ok(Vec::new());
        }

        let members = StoreMember::belonging_to(&db_stores)
            .select(StoreMember::as_select())
            .load::<StoreMember>(&mut conn)?;

        Ok(db_stores
            .into_iter()
            .map(|store| store.into_domain(&members))
            .collect())
    }
}

impl StoreWriter for DieselRepository {
    fn create_store(&self, new_store: &DomainNewStore) -> RepositoryResult<DomainStore> {
        use crate::schema::{store_members, stores};

        let mut conn = self.conn()?;

        conn.transaction(|conn| {
            let created = diesel::insert_into(stores::table)
                .values(DbNewStore::from(new_store))
                .get_result::<DbStore>(conn)?;

            let rows = new_store.member_rows(created.id);
            if !rows.is_empty() {
                diesel::insert_into(store_members::table)
                    .values(&rows)
                    .execute(conn)?;
            }

            let members = StoreMember::belonging_to(&created)
                .select(StoreMember::as_select())
                .load::<StoreMember>(conn)?;

            Ok(created.into_domain(&members))
        })
    }
}

/// Load one store with its members on an existing connection.
pub(crate) fn load_store(
    conn: &mut SqliteConnection,
    id: i32,
    hub_id: i32,
) -> RepositoryResult<Option<DomainStore>> {
    use crate::schema::stores;

    let store = stores::table
        .filter(stores::id.eq(id))
        .filter(stores::hub_id.eq(hub_id))
        .first::<DbStore>(conn)
        .optional()?;

    let Some(store) = store else {
        return Ok(None);
    };

    let members = StoreMember::belonging_to(&store)
        .select(StoreMember::as_select())
        .load::<StoreMember>(conn)?;

    Ok(Some(store.into_domain(&members)))
}
