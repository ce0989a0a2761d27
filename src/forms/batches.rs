use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::batch::{NewBatch, UpdateBatchDetails};
use crate::domain::transaction::TransactionKind;
use crate::forms::{
    NOTE_MAX_LEN_VALIDATOR, REQUEST_KEY_MAX_LEN_VALIDATOR, clean_optional, sanitize_inline_text,
};
use crate::services::ledger::{AdjustBatchRequest, CreateBatchRequest, MutationRequest};

/// Maximum allowed length for a lot label.
const BATCH_NUMBER_MAX_LEN: usize = 64;
const BATCH_NUMBER_MAX_LEN_VALIDATOR: u64 = BATCH_NUMBER_MAX_LEN as u64;

/// Result type returned by the batch form helpers.
pub type BatchFormResult<T> = Result<T, BatchFormError>;

/// Errors that can occur while processing batch payloads.
#[derive(Debug, Error)]
pub enum BatchFormError {
    /// Validation failures from the `validator` crate.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    /// Opening stock may only be booked as IN or IMPORT.
    #[error("opening stock cannot be booked as {0}")]
    OpeningKind(TransactionKind),
    /// Raw mutations are limited to IN, OUT and IMPORT.
    #[error("{0} cannot be applied as a raw mutation")]
    MutationKind(TransactionKind),
    /// Nothing to change.
    #[error("adjustment changes nothing")]
    EmptyAdjustment,
    /// Both a new expiry and `clear_expiry` were supplied.
    #[error("expiry date cannot be set and cleared at once")]
    ConflictingExpiry,
}

/// Payload of `POST /v1/batches`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBatchForm {
    #[validate(range(min = 1))]
    pub product_id: i32,
    #[validate(range(min = 1))]
    pub store_id: i32,
    /// Opening stock in minor units.
    #[validate(range(min = 1))]
    pub quantity: i32,
    /// IN unless stated otherwise.
    #[serde(rename = "type")]
    pub kind: Option<TransactionKind>,
    #[validate(length(max = BATCH_NUMBER_MAX_LEN_VALIDATOR))]
    pub batch_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    #[validate(length(max = NOTE_MAX_LEN_VALIDATOR))]
    pub note: Option<String>,
    #[validate(length(min = 1, max = REQUEST_KEY_MAX_LEN_VALIDATOR))]
    pub request_key: Option<String>,
}

impl CreateBatchForm {
    pub fn into_request(self, hub_id: i32) -> BatchFormResult<CreateBatchRequest> {
        self.validate()?;

        let kind = self.kind.unwrap_or(TransactionKind::In);
        if !matches!(kind, TransactionKind::In | TransactionKind::Import) {
            return Err(BatchFormError::OpeningKind(kind));
        }

        let mut new_batch = NewBatch::new(hub_id, self.product_id, self.store_id);
        if let Some(batch_number) = clean_optional(self.batch_number) {
            new_batch = new_batch.with_batch_number(batch_number);
        }
        if let Some(expiry_date) = self.expiry_date {
            new_batch = new_batch.with_expiry(expiry_date);
        }

        Ok(CreateBatchRequest {
            new_batch,
            quantity: self.quantity,
            kind,
            note: clean_optional(self.note),
            request_key: self.request_key.map(|key| key.trim().to_string()),
        })
    }
}

/// Payload of `POST /v1/batches/{id}/mutations`.
#[derive(Debug, Deserialize, Validate)]
pub struct MutateBatchForm {
    /// Signed change in minor units.
    pub delta: i32,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[validate(length(max = NOTE_MAX_LEN_VALIDATOR))]
    pub note: Option<String>,
    #[validate(length(min = 1, max = REQUEST_KEY_MAX_LEN_VALIDATOR))]
    pub request_key: Option<String>,
}

impl MutateBatchForm {
    pub fn into_request(self, batch_id: i32) -> BatchFormResult<MutationRequest> {
        self.validate()?;

        if !matches!(
            self.kind,
            TransactionKind::In | TransactionKind::Out | TransactionKind::Import
        ) {
            return Err(BatchFormError::MutationKind(self.kind));
        }

        Ok(MutationRequest {
            batch_id,
            delta: self.delta,
            kind: self.kind,
            note: clean_optional(self.note),
            request_key: self.request_key.map(|key| key.trim().to_string()),
        })
    }
}

/// Payload of `POST /v1/batches/{id}/adjust`.
#[derive(Debug, Deserialize, Validate)]
pub struct AdjustBatchForm {
    /// Target quantity in minor units.
    #[validate(range(min = 0))]
    pub quantity: Option<i32>,
    #[validate(length(min = 1, max = BATCH_NUMBER_MAX_LEN_VALIDATOR))]
    pub batch_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub clear_expiry: bool,
    #[validate(length(max = NOTE_MAX_LEN_VALIDATOR))]
    pub note: Option<String>,
    #[validate(length(min = 1, max = REQUEST_KEY_MAX_LEN_VALIDATOR))]
    pub request_key: Option<String>,
}

impl AdjustBatchForm {
    pub fn into_request(self, batch_id: i32) -> BatchFormResult<AdjustBatchRequest> {
        self.validate()?;

        let expiry_date = match (self.expiry_date, self.clear_expiry) {
            (Some(_), true) => return Err(BatchFormError::ConflictingExpiry),
            (Some(date), false) => Some(Some(date)),
            (None, true) => Some(None),
            (None, false) => None,
        };
        let details = UpdateBatchDetails {
            batch_number: self
                .batch_number
                .map(|value| sanitize_inline_text(&value))
                .filter(|value| !value.is_empty()),
            expiry_date,
        };

        if self.quantity.is_none() && details.is_empty() {
            return Err(BatchFormError::EmptyAdjustment);
        }

        Ok(AdjustBatchRequest {
            batch_id,
            quantity: self.quantity,
            details,
            note: clean_optional(self.note),
            request_key: self.request_key.map(|key| key.trim().to_string()),
        })
    }
}

/// Query string accepted by the archive endpoints.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ArchiveQuery {
    #[validate(length(max = NOTE_MAX_LEN_VALIDATOR))]
    pub note: Option<String>,
}

impl ArchiveQuery {
    pub fn into_note(self) -> BatchFormResult<Option<String>> {
        self.validate()?;
        Ok(clean_optional(self.note))
    }
}
