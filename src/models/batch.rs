use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;

use crate::domain::batch::{
    Batch as DomainBatch, NewBatch as DomainNewBatch, UpdateBatchDetails as DomainUpdateDetails,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::batches)]
pub struct Batch {
    pub id: i32,
    pub hub_id: i32,
    pub product_id: i32,
    pub store_id: i32,
    pub batch_number: String,
    pub quantity: i32,
    pub expiry_date: Option<NaiveDate>,
    pub is_archived: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::batches)]
pub struct NewBatch<'a> {
    pub hub_id: i32,
    pub product_id: i32,
    pub store_id: i32,
    pub batch_number: &'a str,
    pub quantity: i32,
    pub expiry_date: Option<NaiveDate>,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::batches)]
pub struct UpdateBatchDetails<'a> {
    pub batch_number: Option<&'a str>,
    pub expiry_date: Option<Option<NaiveDate>>,
    pub updated_at: NaiveDateTime,
}

impl From<Batch> for DomainBatch {
    fn from(value: Batch) -> Self {
        Self {
            id: value.id,
            hub_id: value.hub_id,
            product_id: value.product_id,
            store_id: value.store_id,
            batch_number: value.batch_number,
            quantity: value.quantity,
            expiry_date: value.expiry_date,
            is_archived: value.is_archived,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl<'a> From<&'a DomainNewBatch> for NewBatch<'a> {
    fn from(value: &'a DomainNewBatch) -> Self {
        Self {
            hub_id: value.hub_id,
            product_id: value.product_id,
            store_id: value.store_id,
            batch_number: value.batch_number.as_str(),
            quantity: 0,
            expiry_date: value.expiry_date,
        }
    }
}

impl<'a> UpdateBatchDetails<'a> {
    pub fn new(value: &'a DomainUpdateDetails, updated_at: NaiveDateTime) -> Self {
        Self {
            batch_number: value.batch_number.as_deref(),
            expiry_date: value.expiry_date,
            updated_at,
        }
    }
}
