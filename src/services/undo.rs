//! Reversal of past ledger entries.
//!
//! An entry moves from active to undone exactly once. The compensating
//! RESTORE entries and the flag flip commit together.

use crate::domain::batch::{Batch, UpdateBatchDetails};
use crate::domain::permission::may_undo;
use crate::domain::transaction::{
    Operator, StockMutation, StockTransaction, TransactionKind, TransactionSnapshot,
    TransferDirection,
};
use crate::domain::user::User;
use crate::errors::{LedgerError, LedgerResult, RestoreConflict};
use crate::repository::{LedgerSession, LedgerStore, TransactionReader, UserReader};
use crate::services::ledger::mutate;
use crate::services::permissions::PermissionRegistry;

/// Undo `transaction_id` on behalf of `actor`.
///
/// Returns the RESTORE entries written, one per batch touched.
pub fn undo<R>(
    repo: &R,
    registry: &PermissionRegistry,
    actor: &User,
    transaction_id: i32,
    note: Option<String>,
) -> LedgerResult<Vec<StockTransaction>>
where
    R: LedgerStore + TransactionReader + UserReader + ?Sized,
{
    let original = repo
        .get_transaction_by_id(transaction_id, actor.hub_id)?
        .ok_or(LedgerError::NotFound)?;
    if original.is_undone {
        return Err(LedgerError::AlreadyUndone { transaction_id });
    }

    let operator_id = original.operator.id;
    let operator_level = if operator_id == actor.id {
        Some(actor.role_level)
    } else {
        repo.get_user_by_id(operator_id, actor.hub_id)?
            .map(|user| user.role_level)
    };

    let rule = registry.get_current(actor.role_level);
    if !may_undo(actor.id, actor.role_level, &rule, operator_id, operator_level) {
        log::warn!(
            "User {} (tier {}) may not undo transaction {transaction_id} by {operator_id}",
            actor.id,
            rule.logs_level
        );
        return Err(LedgerError::PermissionDenied {
            operator_id: Some(operator_id),
        });
    }

    let restored = repo.run_in_transaction(|session| {
        let current = session
            .get_transaction(transaction_id, actor.hub_id)?
            .ok_or(LedgerError::NotFound)?;
        if current.is_undone {
            return Err(LedgerError::AlreadyUndone { transaction_id });
        }

        reverse(session, &current, Operator::from(actor), note)
    })?;

    log::info!(
        "User {} undid transaction {transaction_id} with {} restore entr(ies)",
        actor.id,
        restored.len()
    );

    Ok(restored)
}

/// Write the inverse of `original` and mark it undone.
pub fn reverse(
    session: &mut dyn LedgerSession,
    original: &StockTransaction,
    operator: Operator,
    note: Option<String>,
) -> LedgerResult<Vec<StockTransaction>> {
    let conflict = |reason| LedgerError::cannot_restore(original.id, reason);

    let restored = match (&original.kind, &original.snapshot) {
        (
            TransactionKind::In | TransactionKind::Import | TransactionKind::Out,
            TransactionSnapshot::Movement { .. },
        ) => {
            let delta = if original.kind == TransactionKind::Out {
                original.quantity
            } else {
                -original.quantity
            };
            let batch = active_batch(session, original, original.batch_id)?;
            vec![restore(session, original, &batch, delta, operator, note)?]
        }
        (TransactionKind::Adjust, TransactionSnapshot::Adjust { before, after }) => {
            let batch = active_batch(session, original, original.batch_id)?;

            let details = UpdateBatchDetails {
                batch_number: (batch.batch_number != before.batch_number)
                    .then(|| before.batch_number.clone()),
                expiry_date: (batch.expiry_date != before.expiry_date)
                    .then_some(before.expiry_date),
            };
            session.update_batch_details(batch.id, &details)?;

            let delta = before.quantity - after.quantity;
            vec![restore(session, original, &batch, delta, operator, note)?]
        }
        (
            TransactionKind::Delete,
            TransactionSnapshot::Delete {
                prior,
                product_archived,
            },
        ) => {
            let batch = session
                .lock_batch(original.batch_id, original.hub_id)?
                .ok_or_else(|| conflict(RestoreConflict::BatchMissing))?;
            if !batch.is_archived {
                return Err(conflict(RestoreConflict::BatchActive));
            }

            if *product_archived {
                let product = session
                    .get_product(original.product_id, original.hub_id)?
                    .ok_or_else(|| conflict(RestoreConflict::ProductMissing))?;
                if product.is_archived {
                    session.set_product_archived(product.id, false)?;
                }
            }

            session.set_batch_archived(batch.id, false)?;
            let batch = active_batch(session, original, batch.id)?;
            let delta = prior.quantity - batch.quantity;
            vec![restore(session, original, &batch, delta, operator, note)?]
        }
        (TransactionKind::Transfer, TransactionSnapshot::Transfer { direction, .. }) => {
            let counterpart = transfer_counterpart(session, original, *direction)?;
            if counterpart.is_undone {
                return Err(LedgerError::AlreadyUndone {
                    transaction_id: counterpart.id,
                });
            }

            let (outgoing, incoming) = match direction {
                TransferDirection::Outgoing => (original, &counterpart),
                TransferDirection::Incoming => (&counterpart, original),
            };

            // Take the stock back out of the destination before crediting the source.
            let target = active_batch(session, original, incoming.batch_id)?;
            let take_back = restore(
                session,
                incoming,
                &target,
                -incoming.quantity,
                operator.clone(),
                note.clone(),
            )?;
            let source = active_batch(session, original, outgoing.batch_id)?;
            let give_back = restore(
                session,
                outgoing,
                &source,
                outgoing.quantity,
                operator,
                note,
            )?;

            mark_undone(session, counterpart.id)?;
            vec![take_back, give_back]
        }
        (TransactionKind::Restore, _) => {
            return Err(conflict(RestoreConflict::NotReversible));
        }
        _ => return Err(conflict(RestoreConflict::SnapshotMismatch)),
    };

    mark_undone(session, original.id)?;
    Ok(restored)
}

fn mark_undone(session: &mut dyn LedgerSession, transaction_id: i32) -> LedgerResult<()> {
    session
        .mark_transaction_undone(transaction_id)
        .map_err(|err| match LedgerError::from(err) {
            LedgerError::NotFound => LedgerError::AlreadyUndone { transaction_id },
            other => other,
        })
}

/// Lock a batch that must still exist and accept mutations.
fn active_batch(
    session: &mut dyn LedgerSession,
    original: &StockTransaction,
    batch_id: i32,
) -> LedgerResult<Batch> {
    let batch = session
        .lock_batch(batch_id, original.hub_id)?
        .ok_or_else(|| LedgerError::cannot_restore(original.id, RestoreConflict::BatchMissing))?;
    if batch.is_archived {
        return Err(LedgerError::cannot_restore(
            original.id,
            RestoreConflict::BatchArchived,
        ));
    }
    Ok(batch)
}

fn restore(
    session: &mut dyn LedgerSession,
    reverses: &StockTransaction,
    batch: &Batch,
    delta: i32,
    operator: Operator,
    note: Option<String>,
) -> LedgerResult<StockTransaction> {
    let mutation = StockMutation::new(
        reverses.hub_id,
        batch.id,
        delta,
        TransactionKind::Restore,
        operator,
    )
    .with_note(note)
    .with_snapshot(TransactionSnapshot::Restore {
        reverses: reverses.id,
        balance_before: batch.quantity,
    });

    mutate(session, mutation)
}

fn transfer_counterpart(
    session: &mut dyn LedgerSession,
    original: &StockTransaction,
    direction: TransferDirection,
) -> LedgerResult<StockTransaction> {
    let missing = || LedgerError::cannot_restore(original.id, RestoreConflict::CounterpartMissing);

    let counterpart = match direction {
        TransferDirection::Incoming => {
            let outgoing_id = original.linked_transaction_id.ok_or_else(missing)?;
            session.get_transaction(outgoing_id, original.hub_id)?
        }
        TransferDirection::Outgoing => session.find_linked_transaction(original.id)?,
    }
    .ok_or_else(missing)?;

    let expected = match direction {
        TransferDirection::Outgoing => TransferDirection::Incoming,
        TransferDirection::Incoming => TransferDirection::Outgoing,
    };
    match &counterpart.snapshot {
        TransactionSnapshot::Transfer { direction, .. }
            if counterpart.kind == TransactionKind::Transfer && *direction == expected =>
        {
            Ok(counterpart)
        }
        _ => Err(missing()),
    }
}
