//! First-expired-first-out depletion across the batches of one store.

use crate::domain::batch::{Batch, BatchQuery, fefo_cmp};
use crate::domain::permission::Capability;
use crate::domain::transaction::{Operator, StockMutation, StockTransaction, TransactionKind};
use crate::domain::user::User;
use crate::errors::{LedgerError, LedgerResult};
use crate::repository::{LedgerSession, LedgerStore};
use crate::services::ledger::{mutate, replay, stockable_product, writable_store};
use crate::services::permissions::PermissionRegistry;

/// Quantity taken from one batch by an allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPick {
    pub batch_id: i32,
    pub take: i32,
}

/// Plan which batches satisfy `quantity`, soonest expiry first.
///
/// Archived and empty batches are skipped. Fails with the shortfall when the
/// batches together hold less than `quantity`.
pub fn plan_fefo(batches: &[Batch], quantity: i32) -> Result<Vec<BatchPick>, i32> {
    let mut eligible: Vec<&Batch> = batches
        .iter()
        .filter(|batch| !batch.is_archived && batch.quantity > 0)
        .collect();
    eligible.sort_by(|a, b| fefo_cmp(a, b));

    let available: i64 = eligible.iter().map(|batch| i64::from(batch.quantity)).sum();
    if available < i64::from(quantity) {
        let shortfall = i64::from(quantity) - available;
        return Err(i32::try_from(shortfall).unwrap_or(i32::MAX));
    }

    let mut remaining = quantity;
    let mut picks = Vec::new();
    for batch in eligible {
        if remaining == 0 {
            break;
        }
        let take = batch.quantity.min(remaining);
        picks.push(BatchPick {
            batch_id: batch.id,
            take,
        });
        remaining -= take;
    }

    Ok(picks)
}

/// Outbound request for one product in one store.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub hub_id: i32,
    pub product_id: i32,
    pub store_id: i32,
    pub quantity: i32,
    pub note: Option<String>,
    pub operator: Operator,
    pub request_key: Option<String>,
}

/// Deplete batches for an outbound request. Either every pick is written or
/// the call fails before the first write.
///
/// Returns one OUT entry per batch touched, in depletion order.
pub fn allocate_outbound(
    session: &mut dyn LedgerSession,
    request: OutboundRequest,
) -> LedgerResult<Vec<StockTransaction>> {
    if request.quantity <= 0 {
        return Err(LedgerError::invalid_quantity(request.quantity));
    }

    let query = BatchQuery::new(request.hub_id)
        .product(request.product_id)
        .store(request.store_id)
        .in_stock_only();
    let batches = session.query_batches(&query)?;

    let picks = plan_fefo(&batches, request.quantity).map_err(|shortfall| {
        LedgerError::InsufficientStock {
            batch_id: None,
            shortfall,
        }
    })?;

    let mut transactions = Vec::with_capacity(picks.len());
    for pick in picks {
        let mutation = StockMutation::new(
            request.hub_id,
            pick.batch_id,
            -pick.take,
            TransactionKind::Out,
            request.operator.clone(),
        )
        .with_note(request.note.clone())
        .with_request_key(request.request_key.clone());

        transactions.push(mutate(session, mutation)?);
    }

    log::info!(
        "Allocated {} of product {} in store {} across {} batch(es)",
        request.quantity,
        request.product_id,
        request.store_id,
        transactions.len()
    );

    Ok(transactions)
}

/// Outbound order placed by a user.
#[derive(Debug, Clone)]
pub struct OutboundOrder {
    pub product_id: i32,
    pub store_id: i32,
    pub quantity: i32,
    pub note: Option<String>,
    pub request_key: Option<String>,
}

/// Outbound allocation on behalf of `actor`, in one storage transaction.
pub fn allocate<R>(
    repo: &R,
    registry: &PermissionRegistry,
    actor: &User,
    order: OutboundOrder,
) -> LedgerResult<Vec<StockTransaction>>
where
    R: LedgerStore + ?Sized,
{
    registry.require(Capability::Edit, actor)?;

    repo.run_in_transaction(|session| {
        writable_store(session, registry, actor, order.store_id)?;
        stockable_product(session, actor.hub_id, order.product_id, order.store_id)?;

        let replayed = replay(
            session,
            registry,
            actor,
            order.request_key.as_deref(),
            |entries| {
                let taken: i64 = entries.iter().map(|entry| i64::from(entry.quantity)).sum();
                taken == i64::from(order.quantity)
                    && entries.iter().all(|entry| {
                        entry.kind == TransactionKind::Out
                            && entry.product_id == order.product_id
                            && entry.store_id == order.store_id
                    })
            },
        )?;
        if let Some(existing) = replayed {
            return Ok(existing);
        }

        allocate_outbound(
            session,
            OutboundRequest {
                hub_id: actor.hub_id,
                product_id: order.product_id,
                store_id: order.store_id,
                quantity: order.quantity,
                note: order.note,
                operator: Operator::from(actor),
                request_key: order.request_key,
            },
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory::{InMemoryLedger, fixtures};

    fn order(quantity: i32) -> OutboundOrder {
        OutboundOrder {
            product_id: 10,
            store_id: 1,
            quantity,
            note: None,
            request_key: None,
        }
    }

    fn setup() -> InMemoryLedger {
        let ledger = InMemoryLedger::new();
        ledger.add_store(fixtures::store(1, None));
        ledger.add_product(fixtures::product(10, None));
        ledger.add_batch(fixtures::batch(1, 10, 1, 5, Some("2024-01-01"), 3));
        ledger.add_batch(fixtures::batch(2, 10, 1, 5, Some("2024-02-01"), 1));
        ledger.add_batch(fixtures::batch(3, 10, 1, 5, None, 1));
        ledger.add_user(fixtures::user(1, 4, vec![1]));
        ledger
    }

    #[test]
    fn depletes_soonest_expiry_first() {
        let ledger = setup();
        let registry = PermissionRegistry::new();

        let entries = allocate(&ledger, &registry, &ledger.user(1), order(8)).unwrap();

        let touched: Vec<(i32, i32)> = entries.iter().map(|e| (e.batch_id, e.quantity)).collect();
        assert_eq!(touched, vec![(1, 5), (2, 3)]);
        assert!(entries.iter().all(|e| e.kind == TransactionKind::Out));
        assert_eq!(ledger.batch(1).quantity, 0);
        assert_eq!(ledger.batch(2).quantity, 2);
        assert_eq!(ledger.batch(3).quantity, 5);
    }

    #[test]
    fn shortfall_leaves_every_batch_unchanged() {
        let ledger = InMemoryLedger::new();
        ledger.add_store(fixtures::store(1, None));
        ledger.add_product(fixtures::product(10, None));
        ledger.add_batch(fixtures::batch(1, 10, 1, 4, Some("2024-01-01"), 1));
        ledger.add_batch(fixtures::batch(2, 10, 1, 3, None, 1));
        ledger.add_user(fixtures::user(1, 4, vec![1]));
        let registry = PermissionRegistry::new();

        let result = allocate(&ledger, &registry, &ledger.user(1), order(10));

        assert!(matches!(
            result,
            Err(LedgerError::InsufficientStock {
                batch_id: None,
                shortfall: 3
            })
        ));
        assert_eq!(ledger.batch(1).quantity, 4);
        assert_eq!(ledger.batch(2).quantity, 3);
        assert!(ledger.transactions().is_empty());
    }

    #[test]
    fn failure_mid_walk_rolls_back_earlier_picks() {
        let ledger = setup();
        ledger.fail_transaction_insert_after(1);
        let registry = PermissionRegistry::new();

        let result = allocate(&ledger, &registry, &ledger.user(1), order(8));

        assert!(matches!(result, Err(LedgerError::StorageUnavailable { .. })));
        assert_eq!(ledger.batch(1).quantity, 5);
        assert_eq!(ledger.batch(2).quantity, 5);
        assert!(ledger.transactions().is_empty());
    }

    #[test]
    fn plan_ignores_other_stock_and_exact_fit_stops_early() {
        let mut batches = vec![
            fixtures::batch(1, 10, 1, 5, Some("2024-01-01"), 1),
            fixtures::batch(2, 10, 1, 0, Some("2023-12-01"), 1),
            fixtures::batch(3, 10, 1, 5, Some("2024-03-01"), 1),
        ];
        batches[2].is_archived = true;

        assert_eq!(
            plan_fefo(&batches, 5),
            Ok(vec![BatchPick {
                batch_id: 1,
                take: 5
            }])
        );
        assert_eq!(plan_fefo(&batches, 6), Err(1));
    }

    #[test]
    fn retried_order_replays_and_reused_key_is_checked() {
        let ledger = setup();
        let registry = PermissionRegistry::new();
        let clerk = ledger.user(1);
        let keyed = |quantity| OutboundOrder {
            request_key: Some("order-7".to_string()),
            ..order(quantity)
        };

        let first = allocate(&ledger, &registry, &clerk, keyed(8)).unwrap();
        let retry = allocate(&ledger, &registry, &clerk, keyed(8)).unwrap();
        let different = allocate(&ledger, &registry, &clerk, keyed(3));

        let first_ids: Vec<i32> = first.iter().map(|e| e.id).collect();
        let retry_ids: Vec<i32> = retry.iter().map(|e| e.id).collect();
        assert_eq!(first_ids, retry_ids);
        assert!(matches!(different, Err(LedgerError::Validation { .. })));
        assert_eq!(ledger.batch(2).quantity, 2);
        assert_eq!(ledger.transactions().len(), 2);
    }

    #[test]
    fn non_positive_request_is_invalid() {
        let ledger = setup();
        let registry = PermissionRegistry::new();

        let result = allocate(&ledger, &registry, &ledger.user(1), order(0));

        assert!(matches!(result, Err(LedgerError::InvalidQuantity { .. })));
    }
}
