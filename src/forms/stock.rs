use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::forms::{NOTE_MAX_LEN_VALIDATOR, REQUEST_KEY_MAX_LEN_VALIDATOR, clean_optional};
use crate::services::allocation::OutboundOrder;
use crate::services::transfer::TransferRequest;

/// Result type returned by the stock movement form helpers.
pub type StockFormResult<T> = Result<T, StockFormError>;

/// Errors that can occur while processing stock movement payloads.
#[derive(Debug, Error)]
pub enum StockFormError {
    /// Validation failures from the `validator` crate.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
}

/// Payload of `POST /v1/outbound`.
#[derive(Debug, Deserialize, Validate)]
pub struct OutboundForm {
    #[validate(range(min = 1))]
    pub product_id: i32,
    #[validate(range(min = 1))]
    pub store_id: i32,
    /// Quantity to ship in minor units.
    #[validate(range(min = 1))]
    pub quantity: i32,
    #[validate(length(max = NOTE_MAX_LEN_VALIDATOR))]
    pub note: Option<String>,
    #[validate(length(min = 1, max = REQUEST_KEY_MAX_LEN_VALIDATOR))]
    pub request_key: Option<String>,
}

impl OutboundForm {
    pub fn into_order(self) -> StockFormResult<OutboundOrder> {
        self.validate()?;

        Ok(OutboundOrder {
            product_id: self.product_id,
            store_id: self.store_id,
            quantity: self.quantity,
            note: clean_optional(self.note),
            request_key: self.request_key.map(|key| key.trim().to_string()),
        })
    }
}

/// Payload of `POST /v1/transfers`.
#[derive(Debug, Deserialize, Validate)]
pub struct TransferForm {
    #[validate(range(min = 1))]
    pub batch_id: i32,
    #[validate(range(min = 1))]
    pub to_store_id: i32,
    #[validate(range(min = 1))]
    pub quantity: i32,
    #[validate(length(max = NOTE_MAX_LEN_VALIDATOR))]
    pub note: Option<String>,
    #[validate(length(min = 1, max = REQUEST_KEY_MAX_LEN_VALIDATOR))]
    pub request_key: Option<String>,
}

impl TransferForm {
    pub fn into_request(self) -> StockFormResult<TransferRequest> {
        self.validate()?;

        Ok(TransferRequest {
            batch_id: self.batch_id,
            to_store_id: self.to_store_id,
            quantity: self.quantity,
            note: clean_optional(self.note),
            request_key: self.request_key.map(|key| key.trim().to_string()),
        })
    }
}

/// Optional body of `POST /v1/transactions/{id}/undo`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UndoForm {
    #[validate(length(max = NOTE_MAX_LEN_VALIDATOR))]
    pub note: Option<String>,
}

impl UndoForm {
    pub fn into_note(self) -> StockFormResult<Option<String>> {
        self.validate()?;
        Ok(clean_optional(self.note))
    }
}
