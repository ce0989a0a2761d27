use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::permission::{
    LEAST_PRIVILEGED_LEVEL, LogsLevel, RolePermissionRule, SUPER_ADMIN_LEVEL, StoreScope,
};

/// Result type returned by the permission form helpers.
pub type PermissionFormResult<T> = Result<T, PermissionFormError>;

#[derive(Debug, Error)]
pub enum PermissionFormError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("role level {0} is outside 0..=9")]
    UnknownLevel(i32),
}

/// Payload of `PUT /v1/permissions/{level}`. The level comes from the path.
#[derive(Debug, Deserialize, Validate)]
pub struct RolePermissionForm {
    pub logs_level: LogsLevel,
    pub store_scope: StoreScope,
    #[serde(default)]
    pub can_publish_announcements: bool,
    #[serde(default)]
    pub can_export: bool,
    #[serde(default)]
    pub show_logs_page: bool,
    #[serde(default)]
    pub show_reports_page: bool,
    #[serde(default)]
    pub show_settings_page: bool,
}

impl RolePermissionForm {
    pub fn into_rule(self, role_level: i32) -> PermissionFormResult<RolePermissionRule> {
        self.validate()?;

        if !(SUPER_ADMIN_LEVEL..=LEAST_PRIVILEGED_LEVEL).contains(&role_level) {
            return Err(PermissionFormError::UnknownLevel(role_level));
        }

        Ok(RolePermissionRule {
            role_level,
            logs_level: self.logs_level,
            store_scope: self.store_scope,
            can_publish_announcements: self.can_publish_announcements,
            can_export: self.can_export,
            show_logs_page: self.show_logs_page,
            show_reports_page: self.show_reports_page,
            show_settings_page: self.show_settings_page,
        })
    }
}
