//! Stock overview per store context.
//!
//! Parent stores never hold an aggregate of their own: viewing a parent sums
//! its own batches and those of its visible children at read time.

use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::domain::batch::{Batch, BatchQuery};
use crate::domain::product::Product;
use crate::domain::store::{Store, StoreContext};
use crate::domain::units::{self, DisplayQuantity};
use crate::domain::user::User;
use crate::repository::{BatchReader, ProductReader, StoreReader};
use crate::services::permissions::PermissionRegistry;
use crate::services::scoping::{load_visible_products, load_visible_stores};
use crate::services::{ServiceError, ServiceResult};

#[derive(Debug, Clone, Serialize)]
pub struct BatchStock {
    pub batch: Batch,
    pub display: DisplayQuantity,
    /// Expires within the warning window.
    pub expiring_soon: bool,
    pub expired: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductStock {
    pub product: Product,
    /// Total in minor units across the context's stores.
    pub total: i64,
    pub display: DisplayQuantity,
    pub is_low_stock: bool,
    /// Batches in first-expired-first-out order.
    pub batches: Vec<BatchStock>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StockOverview {
    pub context: StoreContext,
    /// Stores whose batches were counted.
    pub stores: Vec<Store>,
    pub products: Vec<ProductStock>,
}

/// Expiry thresholds applied to batch rows.
#[derive(Debug, Clone, Copy)]
pub struct ExpiryWindow {
    pub today: NaiveDate,
    pub warning_days: u64,
}

impl ExpiryWindow {
    fn classify(&self, expiry_date: Option<NaiveDate>) -> (bool, bool) {
        let Some(expiry) = expiry_date else {
            return (false, false);
        };
        let horizon = self
            .today
            .checked_add_days(Days::new(self.warning_days))
            .unwrap_or(NaiveDate::MAX);

        let expired = expiry < self.today;
        (!expired && expiry <= horizon, expired)
    }
}

fn display_total(total: i64, ratio: i32) -> DisplayQuantity {
    units::display(i32::try_from(total).unwrap_or(i32::MAX), Some(ratio))
}

/// Build the per-product rows for `products` from `batches`.
pub fn summarize(
    products: Vec<Product>,
    batches: Vec<Batch>,
    window: ExpiryWindow,
) -> Vec<ProductStock> {
    let mut by_product: HashMap<i32, Vec<Batch>> = HashMap::new();
    for batch in batches {
        by_product.entry(batch.product_id).or_default().push(batch);
    }

    products
        .into_iter()
        .map(|product| {
            let batches = by_product.remove(&product.id).unwrap_or_default();
            let total: i64 = batches.iter().map(|batch| i64::from(batch.quantity)).sum();

            let batches = batches
                .into_iter()
                .map(|batch| {
                    let (expiring_soon, expired) = window.classify(batch.expiry_date);
                    BatchStock {
                        display: units::display(batch.quantity, Some(product.split_ratio)),
                        batch,
                        expiring_soon,
                        expired,
                    }
                })
                .collect();

            ProductStock {
                display: display_total(total, product.split_ratio),
                is_low_stock: product.is_low_stock(total),
                total,
                batches,
                product,
            }
        })
        .collect()
}

/// Stores counted for `context`: every visible store, or the selected store
/// plus its visible children.
fn stores_in_context(visible: Vec<Store>, context: StoreContext) -> ServiceResult<Vec<Store>> {
    let Some(store_id) = context.store_id() else {
        return Ok(visible);
    };

    if !visible.iter().any(|store| store.id == store_id) {
        return Err(ServiceError::NotFound);
    }

    Ok(visible
        .into_iter()
        .filter(|store| store.id == store_id || store.parent_id == Some(store_id))
        .collect())
}

/// Load the stock overview the actor may see in `context`.
pub fn load_stock_overview<R>(
    repo: &R,
    registry: &PermissionRegistry,
    actor: &User,
    context: StoreContext,
    window: ExpiryWindow,
) -> ServiceResult<StockOverview>
where
    R: StoreReader + ProductReader + BatchReader + ?Sized,
{
    let visible = load_visible_stores(repo, registry, actor)?;
    let stores = stores_in_context(visible, context)?;
    let store_ids: Vec<i32> = stores.iter().map(|store| store.id).collect();

    // Store-bound products count only when their store is in the context.
    let products = load_visible_products(repo, registry, actor, StoreContext::All, None)?
        .into_iter()
        .filter(|product| {
            product
                .bound_store_id
                .is_none_or(|bound| store_ids.contains(&bound))
        })
        .collect();

    let batches = repo
        .list_batches(&BatchQuery::new(actor.hub_id).stores(store_ids))
        .map_err(ServiceError::from)?;

    Ok(StockOverview {
        context,
        products: summarize(products, batches, window),
        stores,
    })
}
