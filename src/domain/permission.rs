use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role level with unrestricted authority.
pub const SUPER_ADMIN_LEVEL: i32 = 0;
/// Least privileged role level; unknown levels resolve to it.
pub const LEAST_PRIVILEGED_LEVEL: i32 = 9;

/// Visibility tier for the transaction log. `A` carries the most authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LogsLevel {
    A,
    B,
    C,
    D,
}

impl LogsLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogsLevel::A => "A",
            LogsLevel::B => "B",
            LogsLevel::C => "C",
            LogsLevel::D => "D",
        }
    }
}

impl fmt::Display for LogsLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogsLevel {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(LogsLevel::A),
            "B" => Ok(LogsLevel::B),
            "C" => Ok(LogsLevel::C),
            "D" => Ok(LogsLevel::D),
            other => Err(UnknownValue(other.to_string())),
        }
    }
}

/// Which stores a role may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StoreScope {
    /// Every store in the hub.
    Global,
    /// Allow-listed stores plus stores the user manages or views.
    Limited,
}

impl StoreScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreScope::Global => "GLOBAL",
            StoreScope::Limited => "LIMITED",
        }
    }
}

impl FromStr for StoreScope {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GLOBAL" => Ok(StoreScope::Global),
            "LIMITED" => Ok(StoreScope::Limited),
            other => Err(UnknownValue(other.to_string())),
        }
    }
}

/// Raised when a stored enum column holds a value this build does not know.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value `{0}`")]
pub struct UnknownValue(pub String);

/// Capability bundle shared by every user of one role level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermissionRule {
    pub role_level: i32,
    pub logs_level: LogsLevel,
    pub store_scope: StoreScope,
    pub can_publish_announcements: bool,
    pub can_export: bool,
    pub show_logs_page: bool,
    pub show_reports_page: bool,
    pub show_settings_page: bool,
}

impl RolePermissionRule {
    /// Built-in bundle used when no override is stored for `level`.
    ///
    /// Levels outside `0..=9` get the least privileged bundle.
    pub fn default_for(level: i32) -> Self {
        let level = if (SUPER_ADMIN_LEVEL..=LEAST_PRIVILEGED_LEVEL).contains(&level) {
            level
        } else {
            LEAST_PRIVILEGED_LEVEL
        };

        let logs_level = match level {
            0..=1 => LogsLevel::A,
            2..=3 => LogsLevel::B,
            4..=6 => LogsLevel::C,
            _ => LogsLevel::D,
        };
        let store_scope = if level <= 2 {
            StoreScope::Global
        } else {
            StoreScope::Limited
        };

        Self {
            role_level: level,
            logs_level,
            store_scope,
            can_publish_announcements: level <= 2,
            can_export: level <= 4,
            show_logs_page: level <= 6,
            show_reports_page: level <= 4,
            show_settings_page: level <= 1,
        }
    }
}

/// Named capability that can be checked against a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Edit,
    Delete,
    ManageUsers,
    ManagePermissions,
    PublishAnnouncements,
    ExportData,
    ViewAllStores,
    ViewLogsPage,
    ViewReportsPage,
    ViewSettingsPage,
}

#[derive(Debug, Clone, Copy)]
enum RuleFlag {
    Announcements,
    Export,
    GlobalScope,
    LogsPage,
    ReportsPage,
    SettingsPage,
}

impl RuleFlag {
    fn read(self, rule: &RolePermissionRule) -> bool {
        match self {
            RuleFlag::Announcements => rule.can_publish_announcements,
            RuleFlag::Export => rule.can_export,
            RuleFlag::GlobalScope => rule.store_scope == StoreScope::Global,
            RuleFlag::LogsPage => rule.show_logs_page,
            RuleFlag::ReportsPage => rule.show_reports_page,
            RuleFlag::SettingsPage => rule.show_settings_page,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Requirement {
    /// Allowed when the user's role level is at most this value.
    MaxLevel(i32),
    /// Allowed when the flag is set on the user's current rule.
    Flag(RuleFlag),
}

const CAPABILITY_TABLE: &[(Capability, Requirement)] = &[
    (Capability::Edit, Requirement::MaxLevel(8)),
    (Capability::Delete, Requirement::MaxLevel(1)),
    (Capability::ManageUsers, Requirement::MaxLevel(1)),
    (Capability::ManagePermissions, Requirement::MaxLevel(0)),
    (
        Capability::PublishAnnouncements,
        Requirement::Flag(RuleFlag::Announcements),
    ),
    (Capability::ExportData, Requirement::Flag(RuleFlag::Export)),
    (
        Capability::ViewAllStores,
        Requirement::Flag(RuleFlag::GlobalScope),
    ),
    (Capability::ViewLogsPage, Requirement::Flag(RuleFlag::LogsPage)),
    (
        Capability::ViewReportsPage,
        Requirement::Flag(RuleFlag::ReportsPage),
    ),
    (
        Capability::ViewSettingsPage,
        Requirement::Flag(RuleFlag::SettingsPage),
    ),
];

/// Decide whether `role_level` holding `rule` has `capability`.
///
/// Level 0 passes every check. Capabilities missing from the table are denied.
pub fn evaluate(capability: Capability, role_level: i32, rule: &RolePermissionRule) -> bool {
    if role_level == SUPER_ADMIN_LEVEL {
        return true;
    }

    CAPABILITY_TABLE
        .iter()
        .find(|(candidate, _)| *candidate == capability)
        .map(|(_, requirement)| match requirement {
            Requirement::MaxLevel(max) => role_level <= *max,
            Requirement::Flag(flag) => flag.read(rule),
        })
        .unwrap_or(false)
}

/// Decide whether a requester may undo a transaction written by `operator_id`.
///
/// `operator_level` is the original operator's current role level, or `None`
/// when that user no longer exists (treated as least privileged).
pub fn may_undo(
    requester_id: i32,
    requester_level: i32,
    rule: &RolePermissionRule,
    operator_id: i32,
    operator_level: Option<i32>,
) -> bool {
    if requester_level == SUPER_ADMIN_LEVEL || requester_id == operator_id {
        return true;
    }

    match rule.logs_level {
        LogsLevel::A => true,
        LogsLevel::B => operator_level.unwrap_or(LEAST_PRIVILEGED_LEVEL) > requester_level,
        LogsLevel::C | LogsLevel::D => false,
    }
}
