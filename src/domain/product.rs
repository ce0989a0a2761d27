use chrono::NaiveDateTime;
use pushkind_common::pagination::Pagination;
use serde::{Deserialize, Serialize};

use crate::domain::store::StoreContext;

/// Domain representation of a sellable item definition.
///
/// Stock for a product is always counted in minor units (`split_unit_name`).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Product {
    /// Unique identifier of the product.
    pub id: i32,
    /// Owning hub identifier.
    pub hub_id: i32,
    /// Human-readable name of the product.
    pub name: String,
    /// Optional stock keeping unit identifier.
    pub sku: Option<String>,
    /// Optional free-form category label.
    pub category: Option<String>,
    /// Label of the major unit, for example "case".
    pub unit_name: String,
    /// Label of the minor unit, for example "bottle".
    pub split_unit_name: String,
    /// Number of minor units in one major unit. Always at least 1.
    pub split_ratio: i32,
    /// Threshold in minor units below which the product is low on stock.
    pub min_stock_level: i32,
    /// Store the product is private to; `None` means shared by every store.
    pub bound_store_id: Option<i32>,
    /// Flag indicating whether the product has been archived.
    pub is_archived: bool,
    /// Timestamp for when the product record was created.
    pub created_at: NaiveDateTime,
    /// Timestamp for the last update to the product record.
    pub updated_at: NaiveDateTime,
}

impl Product {
    /// Whether the product may be seen or stocked in `context`.
    pub fn is_visible_in(&self, context: StoreContext) -> bool {
        match (context, self.bound_store_id) {
            (StoreContext::All, _) | (_, None) => true,
            (StoreContext::Store(store_id), Some(bound)) => bound == store_id,
        }
    }

    /// Whether `total` minor units is under the low-stock threshold.
    pub fn is_low_stock(&self, total: i64) -> bool {
        total < i64::from(self.min_stock_level)
    }
}

/// Payload required to insert a new product for a hub.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub hub_id: i32,
    pub name: String,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub unit_name: String,
    pub split_unit_name: String,
    pub split_ratio: i32,
    pub min_stock_level: i32,
    pub bound_store_id: Option<i32>,
    /// Timestamp captured when the product payload was created.
    pub updated_at: NaiveDateTime,
}

impl NewProduct {
    /// Build a product counted in a single unit with no split.
    pub fn new(hub_id: i32, name: impl Into<String>, unit_name: impl Into<String>) -> Self {
        let now = chrono::Local::now().naive_utc();
        let unit_name = unit_name.into();
        Self {
            hub_id,
            name: name.into(),
            sku: None,
            category: None,
            split_unit_name: unit_name.clone(),
            unit_name,
            split_ratio: 1,
            min_stock_level: 0,
            bound_store_id: None,
            updated_at: now,
        }
    }

    /// Attach an SKU identifier to the product payload.
    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Count stock in `split_unit_name`, `ratio` of which make one major unit.
    /// Ratios below 1 are clamped to 1.
    pub fn with_split(mut self, split_unit_name: impl Into<String>, ratio: i32) -> Self {
        self.split_unit_name = split_unit_name.into();
        self.split_ratio = ratio.max(1);
        self
    }

    pub fn with_min_stock_level(mut self, min_stock_level: i32) -> Self {
        self.min_stock_level = min_stock_level;
        self
    }

    /// Make the product private to a single store.
    pub fn bound_to_store(mut self, store_id: i32) -> Self {
        self.bound_store_id = Some(store_id);
        self
    }
}

/// Query definition used to list products for a hub.
#[derive(Debug, Clone)]
pub struct ProductListQuery {
    /// Owning hub identifier.
    pub hub_id: i32,
    /// Optional name or SKU search term.
    pub search: Option<String>,
    /// Optional exact SKU filter, used by scanner input.
    pub sku: Option<String>,
    /// Whether archived products should be included in the results.
    pub include_archived: bool,
    /// Optional pagination options applied to the query.
    pub pagination: Option<Pagination>,
}

impl ProductListQuery {
    /// Construct a query that targets all products belonging to `hub_id`.
    pub fn new(hub_id: i32) -> Self {
        Self {
            hub_id,
            search: None,
            sku: None,
            include_archived: false,
            pagination: None,
        }
    }

    /// Filter the results by a search term applied to the name or SKU.
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Filter the results by an exact SKU match.
    pub fn sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    /// Include archived products in the results.
    pub fn include_archived(mut self) -> Self {
        self.include_archived = true;
        self
    }

    /// Apply pagination to the query with the given page number and page size.
    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}
