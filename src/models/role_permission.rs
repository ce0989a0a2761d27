use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::permission::{RolePermissionRule as DomainRule, UnknownValue};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::role_permissions)]
pub struct RolePermission {
    pub role_level: i32,
    pub logs_level: String,
    pub store_scope: String,
    pub can_publish_announcements: bool,
    pub can_export: bool,
    pub show_logs_page: bool,
    pub show_reports_page: bool,
    pub show_settings_page: bool,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::role_permissions)]
pub struct UpsertRolePermission<'a> {
    pub role_level: i32,
    pub logs_level: &'a str,
    pub store_scope: &'a str,
    pub can_publish_announcements: bool,
    pub can_export: bool,
    pub show_logs_page: bool,
    pub show_reports_page: bool,
    pub show_settings_page: bool,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<RolePermission> for DomainRule {
    type Error = diesel::result::Error;

    fn try_from(value: RolePermission) -> Result<Self, Self::Error> {
        let decode = |err: UnknownValue| diesel::result::Error::DeserializationError(Box::new(err));
        Ok(Self {
            role_level: value.role_level,
            logs_level: value.logs_level.parse().map_err(decode)?,
            store_scope: value.store_scope.parse().map_err(decode)?,
            can_publish_announcements: value.can_publish_announcements,
            can_export: value.can_export,
            show_logs_page: value.show_logs_page,
            show_reports_page: value.show_reports_page,
            show_settings_page: value.show_settings_page,
        })
    }
}

impl<'a> UpsertRolePermission<'a> {
    pub fn new(rule: &'a DomainRule, updated_at: NaiveDateTime) -> Self {
        Self {
            role_level: rule.role_level,
            logs_level: rule.logs_level.as_str(),
            store_scope: rule.store_scope.as_str(),
            can_publish_announcements: rule.can_publish_announcements,
            can_export: rule.can_export,
            show_logs_page: rule.show_logs_page,
            show_reports_page: rule.show_reports_page,
            show_settings_page: rule.show_settings_page,
            updated_at,
        }
    }
}
