use pushkind_common::pagination::Pagination;
use serde::{Deserialize, Serialize};

use crate::domain::permission::LEAST_PRIVILEGED_LEVEL;

/// Inventory actor. Lower `role_level` means more privilege.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i32,
    pub hub_id: i32,
    pub name: String,
    pub email: String,
    pub role_level: i32,
    /// Stores explicitly granted to the user under a limited store scope.
    pub allowed_store_ids: Vec<i32>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewUser {
    pub hub_id: i32,
    pub name: String,
    pub email: String,
    pub role_level: i32,
    pub allowed_store_ids: Vec<i32>,
}

impl NewUser {
    #[must_use]
    pub fn new(hub_id: i32, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            hub_id,
            name: name.into(),
            email: email.into().to_lowercase(),
            role_level: LEAST_PRIVILEGED_LEVEL,
            allowed_store_ids: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_role_level(mut self, role_level: i32) -> Self {
        self.role_level = role_level;
        self
    }

    #[must_use]
    pub fn with_allowed_stores(mut self, store_ids: Vec<i32>) -> Self {
        self.allowed_store_ids = store_ids;
        self
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub role_level: Option<i32>,
    /// Replaces the allow-list when present.
    pub allowed_store_ids: Option<Vec<i32>>,
}

#[derive(Debug, Clone)]
/// Query definition used to filter and paginate users for a hub.
pub struct UserListQuery {
    pub hub_id: i32,
    pub search: Option<String>,
    /// Only users whose role level is at least this value.
    pub min_role_level: Option<i32>,
    pub pagination: Option<Pagination>,
}

impl UserListQuery {
    pub fn new(hub_id: i32) -> Self {
        Self {
            hub_id,
            search: None,
            min_role_level: None,
            pagination: None,
        }
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn min_role_level(mut self, level: i32) -> Self {
        self.min_role_level = Some(level);
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}
