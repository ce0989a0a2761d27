//! JSON endpoints under `/v1`.

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde_json::json;

use crate::errors::LedgerError;
use crate::services::ServiceError;

pub mod permissions;
pub mod stock;
pub mod stores;
pub mod transactions;

/// HTTP status for a ledger failure.
pub fn ledger_status(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::InsufficientStock { .. }
        | LedgerError::AlreadyUndone { .. }
        | LedgerError::CannotRestore { .. }
        | LedgerError::BatchArchived { .. } => StatusCode::CONFLICT,
        LedgerError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
        LedgerError::NotFound => StatusCode::NOT_FOUND,
        LedgerError::InvalidQuantity { .. }
        | LedgerError::Validation { .. }
        | LedgerError::ProductNotInStore { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        LedgerError::StorageUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Structured error body with the matching status.
pub fn ledger_error_response(err: LedgerError) -> HttpResponse {
    let status = ledger_status(&err);
    if status == StatusCode::SERVICE_UNAVAILABLE {
        log::error!("Ledger storage failure: {err}");
    }
    HttpResponse::build(status).json(err)
}

/// Response for read-side failures.
pub fn service_error_response(err: ServiceError) -> HttpResponse {
    match err {
        ServiceError::Unauthorized => HttpResponse::Unauthorized().finish(),
        ServiceError::NotFound => HttpResponse::NotFound().json(LedgerError::NotFound),
        ServiceError::Form(message) => HttpResponse::UnprocessableEntity()
            .json(LedgerError::Validation { message }),
        err => {
            log::error!("Request failed: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// 422 for payloads rejected before reaching the ledger.
pub fn form_error_response(err: impl std::fmt::Display) -> HttpResponse {
    HttpResponse::UnprocessableEntity().json(json!({
        "kind": "validation",
        "message": err.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RestoreConflict;

    #[test]
    fn conflicts_map_to_409() {
        for err in [
            LedgerError::InsufficientStock {
                batch_id: Some(1),
                shortfall: 2,
            },
            LedgerError::AlreadyUndone { transaction_id: 4 },
            LedgerError::cannot_restore(4, RestoreConflict::BatchMissing),
            LedgerError::BatchArchived { batch_id: 1 },
        ] {
            assert_eq!(ledger_status(&err), StatusCode::CONFLICT, "{err}");
        }
    }

    #[test]
    fn remaining_kinds_map_to_their_statuses() {
        assert_eq!(
            ledger_status(&LedgerError::PermissionDenied { operator_id: None }),
            StatusCode::FORBIDDEN
        );
        assert_eq!(ledger_status(&LedgerError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            ledger_status(&LedgerError::invalid_quantity(-3)),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ledger_status(&LedgerError::ProductNotInStore {
                product_id: 1,
                store_id: 2
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ledger_status(&LedgerError::StorageUnavailable {
                message: "locked".to_string()
            }),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn service_errors_map_to_statuses() {
        assert_eq!(
            service_error_response(ServiceError::Unauthorized).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            service_error_response(ServiceError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            service_error_response(ServiceError::Form("bad".to_string())).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
