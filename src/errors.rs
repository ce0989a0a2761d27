//! Structured failures of ledger, allocation and undo operations.

use pushkind_common::repository::errors::RepositoryError;
use serde::Serialize;
use thiserror::Error;

/// Result type returned by ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Why a past transaction could not be restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreConflict {
    /// The batch row no longer exists.
    BatchMissing,
    /// The batch was expected to be archived but is active again.
    BatchActive,
    /// The batch was archived after the transaction and must be restored first.
    BatchArchived,
    /// The archived product row no longer exists.
    ProductMissing,
    /// The transaction kind has no inverse.
    NotReversible,
    /// The stored snapshot does not match the transaction kind.
    SnapshotMismatch,
    /// The linked transfer leg is missing.
    CounterpartMissing,
}

/// Errors surfaced by the stock ledger. Context is structured; callers own
/// the user-facing wording.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerError {
    /// A depletion would drive stock negative. Nothing was written.
    #[error("insufficient stock: short by {shortfall}")]
    InsufficientStock {
        /// Batch that would go negative, when a single batch is involved.
        batch_id: Option<i32>,
        shortfall: i32,
    },
    /// The actor lacks authority for the action.
    #[error("permission denied")]
    PermissionDenied {
        /// Operator of the transaction that could not be touched.
        operator_id: Option<i32>,
    },
    #[error("transaction {transaction_id} is already undone")]
    AlreadyUndone { transaction_id: i32 },
    #[error("not found")]
    NotFound,
    #[error("transaction {transaction_id} cannot be restored: {reason:?}")]
    CannotRestore {
        transaction_id: i32,
        reason: RestoreConflict,
    },
    /// The batch is archived and no longer accepts mutations.
    #[error("batch {batch_id} is archived")]
    BatchArchived { batch_id: i32 },
    /// The product is bound to a different store than the one requested.
    #[error("product {product_id} is not stocked in store {store_id}")]
    ProductNotInStore { product_id: i32, store_id: i32 },
    /// Quantity or sign contradicts the requested operation.
    #[error("invalid quantity {quantity}")]
    InvalidQuantity { quantity: i64 },
    #[error("validation failed: {message}")]
    Validation { message: String },
    /// Transient storage failure; safe to surface for a manual retry.
    #[error("storage unavailable: {message}")]
    StorageUnavailable { message: String },
}

impl From<RepositoryError> for LedgerError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => LedgerError::NotFound,
            other => {
                log::error!("Storage failure: {other}");
                LedgerError::StorageUnavailable {
                    message: other.to_string(),
                }
            }
        }
    }
}

impl From<diesel::result::Error> for LedgerError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => LedgerError::NotFound,
            other => {
                log::error!("Storage failure: {other}");
                LedgerError::StorageUnavailable {
                    message: other.to_string(),
                }
            }
        }
    }
}

impl LedgerError {
    pub fn invalid_quantity(quantity: impl Into<i64>) -> Self {
        LedgerError::InvalidQuantity {
            quantity: quantity.into(),
        }
    }

    pub fn cannot_restore(transaction_id: i32, reason: RestoreConflict) -> Self {
        LedgerError::CannotRestore {
            transaction_id,
            reason,
        }
    }
}
