use diesel::prelude::*;
use pushkind_common::repository::errors::RepositoryResult;

use crate::{
    domain::permission::RolePermissionRule,
    models::role_permission::{RolePermission as DbRolePermission, UpsertRolePermission},
    repository::{DieselRepository, RolePermissionReader, RolePermissionWriter},
};

impl RolePermissionReader for DieselRepository {
    fn list_role_permissions(&self) -> RepositoryResult<Vec<RolePermissionRule>> {
        use crate::schema::role_permissions;

        let mut conn = self.conn()?;

        let rows = role_permissions::table
            .order(role_permissions::role_level.asc())
            .load::<DbRolePermission>(&mut conn)?;

        let mut rules = Vec::with_capacity(rows.len());
        for row in rows {
            rules.push(RolePermissionRule::try_from(row)?);
        }

        Ok(rules)
    }
}

impl RolePermissionWriter for DieselRepository {
    fn upsert_role_permission(
        &self,
        rule: &RolePermissionRule,
    ) -> RepositoryResult<RolePermissionRule> {
        use crate::schema::role_permissions;

        let mut conn = self.conn()?;
        let row = UpsertRolePermission::new(rule, chrono::Local::now().naive_utc());

        let stored = diesel::insert_into(role_permissions::table)
            .values(&row)
            .on_conflict(role_permissions::role_level)
            .do_update()
            .set(&row)
            .get_result::<DbRolePermission>(&mut conn)?;

        Ok(RolePermissionRule::try_from(stored)?)
    }
}
