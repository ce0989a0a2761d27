use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use pushkind_common::pagination::Pagination;
use serde::{Deserialize, Serialize};

use crate::domain::batch::BatchState;
use crate::domain::permission::UnknownValue;
use crate::domain::user::User;

/// Kind of quantity change recorded by a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    In,
    Out,
    Adjust,
    Import,
    Transfer,
    Delete,
    Restore,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::In => "IN",
            TransactionKind::Out => "OUT",
            TransactionKind::Adjust => "ADJUST",
            TransactionKind::Import => "IMPORT",
            TransactionKind::Transfer => "TRANSFER",
            TransactionKind::Delete => "DELETE",
            TransactionKind::Restore => "RESTORE",
        }
    }

    /// Whether `delta` has a sign this kind can carry.
    ///
    /// IN and IMPORT only credit, OUT and DELETE only deplete; the remaining
    /// kinds move stock in either direction.
    pub fn accepts_delta(&self, delta: i32) -> bool {
        match self {
            TransactionKind::In | TransactionKind::Import => delta > 0,
            TransactionKind::Out => delta < 0,
            TransactionKind::Delete => delta <= 0,
            TransactionKind::Adjust | TransactionKind::Transfer | TransactionKind::Restore => true,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN" => Ok(TransactionKind::In),
            "OUT" => Ok(TransactionKind::Out),
            "ADJUST" => Ok(TransactionKind::Adjust),
            "IMPORT" => Ok(TransactionKind::Import),
            "TRANSFER" => Ok(TransactionKind::Transfer),
            "DELETE" => Ok(TransactionKind::Delete),
            "RESTORE" => Ok(TransactionKind::Restore),
            other => Err(UnknownValue(other.to_string())),
        }
    }
}

/// Which side of a transfer a TRANSFER entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferDirection {
    Outgoing,
    Incoming,
}

/// Structured pre/post state stored with every ledger entry. Each variant
/// holds exactly what is needed to invert its transaction kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransactionSnapshot {
    /// IN, IMPORT and OUT: plain quantity movement.
    Movement { balance_before: i32 },
    Adjust { before: BatchState, after: BatchState },
    Transfer {
        direction: TransferDirection,
        counterpart_batch_id: i32,
        counterpart_store_id: i32,
        balance_before: i32,
    },
    Delete {
        prior: BatchState,
        /// The product itself was archived by the same operation.
        product_archived: bool,
    },
    Restore {
        reverses: i32,
        balance_before: i32,
    },
}

impl TransactionSnapshot {
    /// Whether this payload shape belongs to `kind`.
    pub fn fits(&self, kind: TransactionKind) -> bool {
        matches!(
            (self, kind),
            (
                TransactionSnapshot::Movement { .. },
                TransactionKind::In | TransactionKind::Import | TransactionKind::Out
            ) | (TransactionSnapshot::Adjust { .. }, TransactionKind::Adjust)
                | (TransactionSnapshot::Transfer { .. }, TransactionKind::Transfer)
                | (TransactionSnapshot::Delete { .. }, TransactionKind::Delete)
                | (TransactionSnapshot::Restore { .. }, TransactionKind::Restore)
        )
    }
}

/// Identity of whoever performed a ledger operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub id: i32,
    pub name: String,
}

impl From<&User> for Operator {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
        }
    }
}

/// Immutable ledger entry. Only `is_undone` ever changes after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockTransaction {
    pub id: i32,
    pub hub_id: i32,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub product_id: i32,
    pub store_id: i32,
    pub batch_id: i32,
    /// Magnitude of the change; the sign is implied by `kind` and snapshot.
    pub quantity: i32,
    /// Batch quantity right after this entry.
    pub balance_after: i32,
    pub timestamp: NaiveDateTime,
    pub operator: Operator,
    pub note: Option<String>,
    #[serde(rename = "snapshot_data")]
    pub snapshot: TransactionSnapshot,
    /// Other leg of a transfer.
    pub linked_transaction_id: Option<i32>,
    pub request_key: Option<String>,
    pub is_undone: bool,
}

/// Row written by the ledger for one batch mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStockTransaction {
    pub hub_id: i32,
    pub kind: TransactionKind,
    pub product_id: i32,
    pub store_id: i32,
    pub batch_id: i32,
    pub quantity: i32,
    pub balance_after: i32,
    pub operator: Operator,
    pub note: Option<String>,
    pub snapshot: TransactionSnapshot,
    pub linked_transaction_id: Option<i32>,
    pub request_key: Option<String>,
}

/// Request to change one batch's quantity through the ledger.
#[derive(Debug, Clone)]
pub struct StockMutation {
    pub hub_id: i32,
    pub batch_id: i32,
    /// Signed change in minor units.
    pub delta: i32,
    pub kind: TransactionKind,
    pub note: Option<String>,
    pub operator: Operator,
    /// Defaults to a movement snapshot built from the locked batch.
    pub snapshot: Option<TransactionSnapshot>,
    pub linked_transaction_id: Option<i32>,
    pub request_key: Option<String>,
}

impl StockMutation {
    pub fn new(
        hub_id: i32,
        batch_id: i32,
        delta: i32,
        kind: TransactionKind,
        operator: Operator,
    ) -> Self {
        Self {
            hub_id,
            batch_id,
            delta,
            kind,
            note: None,
            operator,
            snapshot: None,
            linked_transaction_id: None,
            request_key: None,
        }
    }

    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }

    pub fn with_snapshot(mut self, snapshot: TransactionSnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    pub fn linked_to(mut self, transaction_id: i32) -> Self {
        self.linked_transaction_id = Some(transaction_id);
        self
    }

    pub fn with_request_key(mut self, request_key: Option<String>) -> Self {
        self.request_key = request_key;
        self
    }
}

/// Query definition used to list ledger entries for a hub.
#[derive(Debug, Clone)]
pub struct TransactionListQuery {
    pub hub_id: i32,
    /// Restrict to these stores when present.
    pub store_ids: Option<Vec<i32>>,
    /// Restrict to these operators when present.
    pub operator_ids: Option<Vec<i32>>,
    pub product_id: Option<i32>,
    pub batch_id: Option<i32>,
    pub include_undone: bool,
    pub pagination: Option<Pagination>,
}

impl TransactionListQuery {
    pub fn new(hub_id: i32) -> Self {
        Self {
            hub_id,
            store_ids: None,
            operator_ids: None,
            product_id: None,
            batch_id: None,
            include_undone: true,
            pagination: None,
        }
    }

    pub fn stores(mut self, store_ids: Vec<i32>) -> Self {
        self.store_ids = Some(store_ids);
        self
    }

    pub fn operators(mut self, operator_ids: Vec<i32>) -> Self {
        self.operator_ids = Some(operator_ids);
        self
    }

    pub fn product(mut self, product_id: i32) -> Self {
        self.product_id = Some(product_id);
        self
    }

    pub fn batch(mut self, batch_id: i32) -> Self {
        self.batch_id = Some(batch_id);
        self
    }

    pub fn active_only(mut self) -> Self {
        self.include_undone = false;
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_constrain_delta_sign() {
        assert!(TransactionKind::In.accepts_delta(3));
        assert!(!TransactionKind::In.accepts_delta(0));
        assert!(!TransactionKind::Import.accepts_delta(-1));
        assert!(TransactionKind::Out.accepts_delta(-3));
        assert!(!TransactionKind::Out.accepts_delta(3));
        assert!(TransactionKind::Delete.accepts_delta(0));
        assert!(TransactionKind::Restore.accepts_delta(-4));
    }

    #[test]
    fn snapshot_is_tagged_json() {
        let snapshot = TransactionSnapshot::Restore {
            reverses: 7,
            balance_before: 10,
        };
        let json = serde_json::to_value(&snapshot).expect("serialize snapshot");
        assert_eq!(json["kind"], "restore");
        assert_eq!(json["reverses"], 7);

        let back: TransactionSnapshot = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, snapshot);
    }

    #[test]
    fn snapshot_shapes_fit_their_kinds() {
        let movement = TransactionSnapshot::Movement { balance_before: 0 };
        assert!(movement.fits(TransactionKind::In));
        assert!(movement.fits(TransactionKind::Out));
        assert!(!movement.fits(TransactionKind::Delete));
    }

    #[test]
    fn kind_parses_column_text() {
        assert_eq!("TRANSFER".parse(), Ok(TransactionKind::Transfer));
        assert!("SWAP".parse::<TransactionKind>().is_err());
    }
}
