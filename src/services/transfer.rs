//! Moving stock of one batch into another store.

use serde::Serialize;

use crate::domain::batch::{Batch, BatchQuery, NewBatch};
use crate::domain::permission::Capability;
use crate::domain::transaction::{
    Operator, StockMutation, StockTransaction, TransactionKind, TransactionSnapshot,
    TransferDirection,
};
use crate::domain::user::User;
use crate::errors::{LedgerError, LedgerResult};
use crate::repository::{LedgerSession, LedgerStore};
use crate::services::ledger::{mutate, replay, stockable_product, writable_store};
use crate::services::permissions::PermissionRegistry;

#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub batch_id: i32,
    pub to_store_id: i32,
    pub quantity: i32,
    pub note: Option<String>,
    pub request_key: Option<String>,
}

/// Both legs of a transfer. `incoming.linked_transaction_id` is `outgoing.id`.
#[derive(Debug, Clone, Serialize)]
pub struct TransferReceipt {
    pub outgoing: StockTransaction,
    pub incoming: StockTransaction,
}

/// Active batch in `store_id` carrying the same lot label and expiry as
/// `source`, created empty when the store has none.
fn counterpart_batch(
    session: &mut dyn LedgerSession,
    source: &Batch,
    store_id: i32,
) -> LedgerResult<Batch> {
    let candidates = session.query_batches(
        &BatchQuery::new(source.hub_id)
            .product(source.product_id)
            .store(store_id),
    )?;

    if let Some(existing) = candidates.into_iter().find(|batch| {
        batch.batch_number == source.batch_number && batch.expiry_date == source.expiry_date
    }) {
        return Ok(existing);
    }

    let mut new_batch = NewBatch::new(source.hub_id, source.product_id, store_id)
        .with_batch_number(source.batch_number.clone());
    new_batch.expiry_date = source.expiry_date;

    Ok(session.insert_batch(&new_batch)?)
}

/// Move `quantity` from a batch into another store as two linked TRANSFER
/// entries in one storage transaction.
pub fn transfer<R>(
    repo: &R,
    registry: &PermissionRegistry,
    actor: &User,
    request: TransferRequest,
) -> LedgerResult<TransferReceipt>
where
    R: LedgerStore + ?Sized,
{
    registry.require(Capability::Edit, actor)?;

    if request.quantity <= 0 {
        return Err(LedgerError::invalid_quantity(request.quantity));
    }

    repo.run_in_transaction(|session| {
        let source = session
            .lock_batch(request.batch_id, actor.hub_id)?
            .ok_or(LedgerError::NotFound)?;
        writable_store(session, registry, actor, source.store_id)?;

        let replayed = replay(
            session,
            registry,
            actor,
            request.request_key.as_deref(),
            |entries| match entries {
                [outgoing, incoming] => {
                    outgoing.kind == TransactionKind::Transfer
                        && incoming.kind == TransactionKind::Transfer
                        && outgoing.batch_id == source.id
                        && outgoing.quantity == request.quantity
                        && incoming.store_id == request.to_store_id
                        && incoming.linked_transaction_id == Some(outgoing.id)
                }
                _ => false,
            },
        )?;
        if let Some(existing) = replayed {
            let mut legs = existing.into_iter();
            return match (legs.next(), legs.next()) {
                (Some(outgoing), Some(incoming)) => Ok(TransferReceipt { outgoing, incoming }),
                _ => Err(LedgerError::NotFound),
            };
        }

        if source.is_archived {
            return Err(LedgerError::BatchArchived {
                batch_id: source.id,
            });
        }
        if source.store_id == request.to_store_id {
            return Err(LedgerError::Validation {
                message: "source and destination store are the same".to_string(),
            });
        }

        let destination = writable_store(session, registry, actor, request.to_store_id)?;
        stockable_product(session, actor.hub_id, source.product_id, destination.id)?;

        let target = counterpart_batch(session, &source, destination.id)?;
        let operator = Operator::from(actor);

        let outgoing = mutate(
            session,
            StockMutation::new(
                actor.hub_id,
                source.id,
                -request.quantity,
                TransactionKind::Transfer,
                operator.clone(),
            )
            .with_note(request.note.clone())
            .with_snapshot(TransactionSnapshot::Transfer {
                direction: TransferDirection::Outgoing,
                counterpart_batch_id: target.id,
                counterpart_store_id: destination.id,
                balance_before: source.quantity,
            })
            .with_request_key(request.request_key.clone()),
        )?;

        let incoming = mutate(
            session,
            StockMutation::new(
                actor.hub_id,
                target.id,
                request.quantity,
                TransactionKind::Transfer,
                operator,
            )
            .with_note(request.note)
            .with_snapshot(TransactionSnapshot::Transfer {
                direction: TransferDirection::Incoming,
                counterpart_batch_id: source.id,
                counterpart_store_id: source.store_id,
                balance_before: target.quantity,
            })
            .linked_to(outgoing.id)
            .with_request_key(request.request_key),
        )?;

        Ok(TransferReceipt { outgoing, incoming })
    })
}
