use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Physical or logical location holding batches.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Store {
    pub id: i32,
    pub hub_id: i32,
    /// Aggregating parent store, if any.
    pub parent_id: Option<i32>,
    pub name: String,
    /// Users managing the store regardless of their role scope.
    pub managers: Vec<i32>,
    /// Users allowed to view the store regardless of their role scope.
    pub viewers: Vec<i32>,
    pub is_archived: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Store {
    /// Whether the user is listed as a manager or viewer.
    pub fn has_member(&self, user_id: i32) -> bool {
        self.managers.contains(&user_id) || self.viewers.contains(&user_id)
    }
}

#[derive(Debug, Clone)]
pub struct NewStore {
    pub hub_id: i32,
    pub parent_id: Option<i32>,
    pub name: String,
    pub managers: Vec<i32>,
    pub viewers: Vec<i32>,
}

impl NewStore {
    pub fn new(hub_id: i32, name: impl Into<String>) -> Self {
        Self {
            hub_id,
            parent_id: None,
            name: name.into(),
            managers: Vec::new(),
            viewers: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent_id: i32) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_managers(mut self, managers: Vec<i32>) -> Self {
        self.managers = managers;
        self
    }

    pub fn with_viewers(mut self, viewers: Vec<i32>) -> Self {
        self.viewers = viewers;
        self
    }
}

/// Membership kind stored for a user on a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Membership {
    Manager,
    Viewer,
}

impl Membership {
    pub fn as_str(&self) -> &'static str {
        match self {
            Membership::Manager => "manager",
            Membership::Viewer => "viewer",
        }
    }
}

/// Which store(s) a read is evaluated against. Parsed from `"all"` or a
/// numeric store id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StoreContext {
    /// No store binding filter.
    #[default]
    All,
    Store(i32),
}

impl StoreContext {
    pub fn store_id(&self) -> Option<i32> {
        match self {
            StoreContext::All => None,
            StoreContext::Store(id) => Some(*id),
        }
    }
}

impl TryFrom<String> for StoreContext {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("all") {
            return Ok(StoreContext::All);
        }
        value
            .parse::<i32>()
            .map(StoreContext::Store)
            .map_err(|_| format!("invalid store context `{value}`"))
    }
}

impl From<StoreContext> for String {
    fn from(value: StoreContext) -> Self {
        match value {
            StoreContext::All => "all".to_string(),
            StoreContext::Store(id) => id.to_string(),
        }
    }
}

/// Parent store with its visible children. Quantities for a parent are always
/// derived from its children and never stored.
#[derive(Debug, Clone, Serialize)]
pub struct StoreNode {
    pub store: Store,
    pub children: Vec<Store>,
}
