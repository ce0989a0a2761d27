use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::transaction::{
    NewStockTransaction as DomainNewTransaction, Operator, StockTransaction as DomainTransaction,
    TransactionKind, TransactionSnapshot,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::stock_transactions)]
pub struct StockTransaction {
    pub id: i32,
    pub hub_id: i32,
    pub kind: String,
    pub product_id: i32,
    pub store_id: i32,
    pub batch_id: i32,
    pub quantity: i32,
    pub balance_after: i32,
    pub operator_id: i32,
    pub operator_name: String,
    pub note: Option<String>,
    pub snapshot_data: String,
    pub linked_transaction_id: Option<i32>,
    pub request_key: Option<String>,
    pub is_undone: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::stock_transactions)]
pub struct NewStockTransaction<'a> {
    pub hub_id: i32,
    pub kind: &'a str,
    pub product_id: i32,
    pub store_id: i32,
    pub batch_id: i32,
    pub quantity: i32,
    pub balance_after: i32,
    pub operator_id: i32,
    pub operator_name: &'a str,
    pub note: Option<&'a str>,
    pub snapshot_data: String,
    pub linked_transaction_id: Option<i32>,
    pub request_key: Option<&'a str>,
    pub created_at: NaiveDateTime,
}

impl TryFrom<StockTransaction> for DomainTransaction {
    type Error = diesel::result::Error;

    fn try_from(value: StockTransaction) -> Result<Self, Self::Error> {
        let kind = value
            .kind
            .parse::<TransactionKind>()
            .map_err(|err| diesel::result::Error::DeserializationError(Box::new(err)))?;
        let snapshot = serde_json::from_str::<TransactionSnapshot>(&value.snapshot_data)
            .map_err(|err| diesel::result::Error::DeserializationError(Box::new(err)))?;

        Ok(Self {
            id: value.id,
            hub_id: value.hub_id,
            kind,
            product_id: value.product_id,
            store_id: value.store_id,
            batch_id: value.batch_id,
            quantity: value.quantity,
            balance_after: value.balance_after,
            timestamp: value.created_at,
            operator: Operator {
                id: value.operator_id,
                name: value.operator_name,
            },
            note: value.note,
            snapshot,
            linked_transaction_id: value.linked_transaction_id,
            request_key: value.request_key,
            is_undone: value.is_undone,
        })
    }
}

impl<'a> NewStockTransaction<'a> {
    pub fn new(
        value: &'a DomainNewTransaction,
        created_at: NaiveDateTime,
    ) -> Result<Self, diesel::result::Error> {
        let snapshot_data = serde_json::to_string(&value.snapshot)
            .map_err(|err| diesel::result::Error::SerializationError(Box::new(err)))?;

        Ok(Self {
            hub_id: value.hub_id,
            kind: value.kind.as_str(),
            product_id: value.product_id,
            store_id: value.store_id,
            batch_id: value.batch_id,
            quantity: value.quantity,
            balance_after: value.balance_after,
            operator_id: value.operator.id,
            operator_name: value.operator.name.as_str(),
            note: value.note.as_deref(),
            snapshot_data,
            linked_transaction_id: value.linked_transaction_id,
            request_key: value.request_key.as_deref(),
            created_at,
        })
    }
}
