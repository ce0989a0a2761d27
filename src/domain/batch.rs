use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Physical lot of a product held at a store.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Batch {
    pub id: i32,
    pub hub_id: i32,
    pub product_id: i32,
    pub store_id: i32,
    /// Free-text lot label; not unique.
    pub batch_number: String,
    /// Quantity in minor units. Never negative.
    pub quantity: i32,
    pub expiry_date: Option<NaiveDate>,
    pub is_archived: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Batch {
    /// Field values captured in transaction snapshots.
    pub fn state(&self) -> BatchState {
        BatchState {
            quantity: self.quantity,
            batch_number: self.batch_number.clone(),
            expiry_date: self.expiry_date,
        }
    }
}

/// Mutable fields of a batch at one point in time.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct BatchState {
    pub quantity: i32,
    pub batch_number: String,
    pub expiry_date: Option<NaiveDate>,
}

/// Payload used to insert an empty batch row. The opening stock is always
/// credited through the ledger afterwards.
#[derive(Debug, Clone)]
pub struct NewBatch {
    pub hub_id: i32,
    pub product_id: i32,
    pub store_id: i32,
    pub batch_number: String,
    pub expiry_date: Option<NaiveDate>,
}

impl NewBatch {
    pub fn new(hub_id: i32, product_id: i32, store_id: i32) -> Self {
        Self {
            hub_id,
            product_id,
            store_id,
            batch_number: String::new(),
            expiry_date: None,
        }
    }

    pub fn with_batch_number(mut self, batch_number: impl Into<String>) -> Self {
        self.batch_number = batch_number.into();
        self
    }

    pub fn with_expiry(mut self, expiry_date: NaiveDate) -> Self {
        self.expiry_date = Some(expiry_date);
        self
    }
}

/// Non-quantity fields changed by an ADJUST. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateBatchDetails {
    pub batch_number: Option<String>,
    pub expiry_date: Option<Option<NaiveDate>>,
}

impl UpdateBatchDetails {
    pub fn is_empty(&self) -> bool {
        self.batch_number.is_none() && self.expiry_date.is_none()
    }
}

/// Filter for batch reads.
#[derive(Debug, Clone)]
pub struct BatchQuery {
    pub hub_id: i32,
    pub product_id: Option<i32>,
    pub store_ids: Option<Vec<i32>>,
    pub include_archived: bool,
    /// Only batches holding stock.
    pub in_stock_only: bool,
}

impl BatchQuery {
    pub fn new(hub_id: i32) -> Self {
        Self {
            hub_id,
            product_id: None,
            store_ids: None,
            include_archived: false,
            in_stock_only: false,
        }
    }

    pub fn product(mut self, product_id: i32) -> Self {
        self.product_id = Some(product_id);
        self
    }

    pub fn store(mut self, store_id: i32) -> Self {
        self.store_ids = Some(vec![store_id]);
        self
    }

    pub fn stores(mut self, store_ids: Vec<i32>) -> Self {
        self.store_ids = Some(store_ids);
        self
    }

    pub fn in_stock_only(mut self) -> Self {
        self.in_stock_only = true;
        self
    }

    pub fn include_archived(mut self) -> Self {
        self.include_archived = true;
        self
    }

    /// Whether `batch` satisfies every filter of the query.
    pub fn matches(&self, batch: &Batch) -> bool {
        batch.hub_id == self.hub_id
            && self.product_id.is_none_or(|id| batch.product_id == id)
            && self
                .store_ids
                .as_ref()
                .is_none_or(|ids| ids.contains(&batch.store_id))
            && (self.include_archived || !batch.is_archived)
            && (!self.in_stock_only || batch.quantity > 0)
    }
}

/// First-expired-first-out ordering: soonest expiry first, batches without an
/// expiry date last, then oldest lot first. Ties fall back to id.
pub fn fefo_cmp(a: &Batch, b: &Batch) -> Ordering {
    let expiry = match (a.expiry_date, b.expiry_date) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };

    expiry
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(id: i32, expiry: Option<(i32, u32, u32)>, created_day: u32) -> Batch {
        let created_at = NaiveDate::from_ymd_opt(2023, 12, created_day)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        Batch {
            id,
            hub_id: 1,
            product_id: 1,
            store_id: 1,
            batch_number: format!("L{id}"),
            quantity: 5,
            expiry_date: expiry.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            is_archived: false,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn fefo_puts_missing_expiry_last_and_breaks_ties_by_age() {
        let mut batches = vec![
            batch(1, None, 1),
            batch(2, Some((2024, 2, 1)), 1),
            batch(3, Some((2024, 1, 1)), 5),
            batch(4, Some((2024, 1, 1)), 2),
        ];
        batches.sort_by(fefo_cmp);

        let order: Vec<i32> = batches.iter().map(|b| b.id).collect();
        assert_eq!(order, vec![4, 3, 2, 1]);
    }

    #[test]
    fn query_matches_filters() {
        let mut item = batch(1, None, 1);
        let query = BatchQuery::new(1).product(1).store(1).in_stock_only();
        assert!(query.matches(&item));

        item.quantity = 0;
        assert!(!query.matches(&item));

        item.quantity = 3;
        item.is_archived = true;
        assert!(!query.matches(&item));
        assert!(query.clone().include_archived().matches(&item));
    }
}
