use std::collections::HashMap;

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use pushkind_common::repository::errors::{RepositoryError, RepositoryResult};

use crate::{
    domain::user::{
        NewUser as DomainNewUser, UpdateUser as DomainUpdateUser, User as DomainUser,
        UserListQuery,
    },
    models::user::{
        NewUser as DbNewUser, NewUserStoreAccess, UpdateUser as DbUpdateUser, User as DbUser,
        UserStoreAccess,
    },
    repository::{DieselRepository, UserReader, UserWriter},
};

impl UserReader for DieselRepository {
    fn get_user_by_id(&self, id: i32, hub_id: i32) -> RepositoryResult<Option<DomainUser>> {
        use crate::schema::users;

        let mut conn = self.conn()?;
        let user = users::table
            .filter(users::id.eq(id))
            .filter(users::hub_id.eq(hub_id))
            .first::<DbUser>(&mut conn)
            .optional()?;

        match user {
            Some(user) => Ok(Some(attach_store_access(&mut conn, user)?)),
            None => Ok(None),
        }
    }

    fn get_user_by_email(&self, email: &str, hub_id: i32) -> RepositoryResult<Option<DomainUser>> {
        use crate::schema::users;

        let mut conn = self.conn()?;
        let user = users::table
            .filter(users::email.eq(email.to_lowercase()))
            .filter(users::hub_id.eq(hub_id))
            .first::<DbUser>(&mut conn)
            .optional()?;

        match user {
            Some(user) => Ok(Some(attach_store_access(&mut conn, user)?)),
            None => Ok(None),
        }
    }

    fn list_users(&self, query: UserListQuery) -> RepositoryResult<(usize, Vec<DomainUser>)> {
        use crate::schema::{user_store_access, users};

        let mut conn = self.conn()?;

        let mut count_query = users::table
            .filter(users::hub_id.eq(query.hub_id))
            .into_boxed::<diesel::sqlite::Sqlite>();

        if let Some(term) = query.search.as_ref() {
            let pattern = format!("%{}%", term);
            count_query = count_query.filter(
                users::name
                    .like(pattern.clone())
                    .or(users::email.like(pattern)),
            );
        }

        if let Some(level) = query.min_role_level {
            count_query = count_query.filter(users::role_level.ge(level));
        }

        let total = count_query.count().get_result::<i64>(&mut conn)? as usize;

        let mut items = users::table
            .filter(users::hub_id.eq(query.hub_id))
            .into_boxed::<diesel::sqlite::Sqlite>();

        if let Some(term) = query.search.as_ref() {
            let pattern = format!("%{}%", term);
            items = items.filter(
                users::name
                    .like(pattern.clone())
                    .or(users::email.like(pattern)),
            );
        }

        if let Some(level) = query.min_role_level {
            items = items.filter(users::role_level.ge(level));
        }

        items = items.order((users::role_level.asc(), users::name.asc()));

        if let Some(pagination) = &query.pagination {
            let offset = ((pagination.page.max(1) - 1) * pagination.per_page) as i64;
            let limit = pagination.per_page as i64;
            items = items.offset(offset).limit(limit);
        }

        let db_users = items.load::<DbUser>(&mut conn)?;

        if db_users.is_empty() {
            return Ok((total, Vec::new()));
        }

        let user_ids: Vec<i32> = db_users.iter().map(|user| user.id).collect();
        let access = user_store_access::table
            .filter(user_store_access::user_id.eq_any(&user_ids))
            .load::<UserStoreAccess>(&mut conn)?;

        let mut access_by_user: HashMap<i32, Vec<i32>> = HashMap::new();
        for row in access {
            access_by_user
                .entry(row.user_id)
                .or_default()
                .push(row.store_id);
        }

        let users = db_users
            .into_iter()
            .map(|user| {
                let allowed = access_by_user.remove(&user.id).unwrap_or_default();
                user.into_domain(allowed)
            })
            .collect();

        Ok((total, users))
    }
}

impl UserWriter for DieselRepository {
    fn create_user(&self, new_user: &DomainNewUser) -> RepositoryResult<DomainUser> {
        use crate::schema::users;

        let mut conn = self.conn()?;

        conn.transaction(|conn| {
            let created = diesel::insert_into(users::table)
                .values(DbNewUser::from(new_user))
                .get_result::<DbUser>(conn)?;

            replace_store_access(conn, created.id, &new_user.allowed_store_ids)?;
            attach_store_access(conn, created)
        })
    }

    fn update_user(
        &self,
        user_id: i32,
        hub_id: i32,
        updates: &DomainUpdateUser,
    ) -> RepositoryResult<DomainUser> {
        use crate::schema::users;

        let mut conn = self.conn()?;

        conn.transaction(|conn| {
            let target = users::table
                .filter(users::id.eq(user_id))
                .filter(users::hub_id.eq(hub_id));

            let updated = diesel::update(target)
                .set(DbUpdateUser::from(updates))
                .get_result::<DbUser>(conn)
                .optional()?
                .ok_or(RepositoryError::NotFound)?;

            if let Some(store_ids) = updates.allowed_store_ids.as_ref() {
                replace_store_access(conn, updated.id, store_ids)?;
            }

            attach_store_access(conn, updated)
        })
    }
}

fn attach_store_access(
    conn: &mut SqliteConnection,
    user: DbUser,
) -> RepositoryResult<DomainUser> {
    use crate::schema::user_store_access;

    let store_ids = user_store_access::table
        .filter(user_store_access::user_id.eq(user.id))
        .order(user_store_access::store_id.asc())
        .select(user_store_access::store_id)
        .load::<i32>(conn)?;

    Ok(user.into_domain(store_ids))
}

fn replace_store_access(
    conn: &mut SqliteConnection,
    user_id: i32,
    store_ids: &[i32],
) -> RepositoryResult<()> {
    use crate::schema::user_store_access;

    diesel::delete(user_store_access::table.filter(user_store_access::user_id.eq(user_id)))
        .execute(conn)?;

    if store_ids.is_empty() {
        return Ok(());
    }

    let rows: Vec<NewUserStoreAccess> = store_ids
        .iter()
        .map(|store_id| NewUserStoreAccess {
            user_id,
            store_id: *store_id,
        })
        .collect();

    diesel::insert_into(user_store_access::table)
        .values(&rows)
        .execute(conn)?;

    Ok(())
}
