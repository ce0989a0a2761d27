//! Batch ledger: the only code path that changes a batch quantity.
//!
//! The free functions taking `&mut dyn LedgerSession` are the core and must
//! run inside [`LedgerStore::run_in_transaction`]. The functions taking a
//! repository check authority and scoping, then open that transaction.

use serde::Serialize;

use crate::domain::batch::{Batch, BatchQuery, NewBatch, UpdateBatchDetails};
use crate::domain::permission::Capability;
use crate::domain::product::Product;
use crate::domain::store::{Store, StoreContext};
use crate::domain::transaction::{
    NewStockTransaction, Operator, StockMutation, StockTransaction, TransactionKind,
    TransactionSnapshot,
};
use crate::domain::user::User;
use crate::errors::{LedgerError, LedgerResult};
use crate::repository::{LedgerSession, LedgerStore};
use crate::services::permissions::PermissionRegistry;
use crate::services::scoping::can_see_store;

/// Apply one signed change to a batch and append its ledger entry.
///
/// The batch is locked for the rest of the surrounding transaction. A result
/// below zero is rejected before anything is written.
pub fn mutate(
    session: &mut dyn LedgerSession,
    mutation: StockMutation,
) -> LedgerResult<StockTransaction> {
    let StockMutation {
        hub_id,
        batch_id,
        delta,
        kind,
        note,
        operator,
        snapshot,
        linked_transaction_id,
        request_key,
    } = mutation;

    if !kind.accepts_delta(delta) {
        return Err(LedgerError::invalid_quantity(delta));
    }
    if let Some(snapshot) = &snapshot
        && !snapshot.fits(kind)
    {
        return Err(LedgerError::Validation {
            message: format!("snapshot does not describe a {kind} entry"),
        });
    }

    let batch = session
        .lock_batch(batch_id, hub_id)?
        .ok_or(LedgerError::NotFound)?;
    if batch.is_archived {
        return Err(LedgerError::BatchArchived { batch_id });
    }

    let new_quantity = i64::from(batch.quantity) + i64::from(delta);
    if new_quantity < 0 {
        return Err(LedgerError::InsufficientStock {
            batch_id: Some(batch_id),
            shortfall: i32::try_from(-new_quantity).unwrap_or(i32::MAX),
        });
    }
    let new_quantity =
        i32::try_from(new_quantity).map_err(|_| LedgerError::invalid_quantity(new_quantity))?;
    let magnitude = delta
        .checked_abs()
        .ok_or_else(|| LedgerError::invalid_quantity(delta))?;

    session.write_batch_quantity(batch_id, new_quantity)?;

    let record = NewStockTransaction {
        hub_id,
        kind,
        product_id: batch.product_id,
        store_id: batch.store_id,
        batch_id,
        quantity: magnitude,
        balance_after: new_quantity,
        operator,
        note,
        snapshot: snapshot.unwrap_or(TransactionSnapshot::Movement {
            balance_before: batch.quantity,
        }),
        linked_transaction_id,
        request_key,
    };
    let created = session.insert_transaction(&record)?;

    log::info!(
        "{} on batch {batch_id} by operator {}: {} -> {new_quantity}",
        kind,
        created.operator.id,
        batch.quantity
    );

    Ok(created)
}

/// Zero a batch through a DELETE entry, then archive it.
///
/// Every quantity change keeps its ledger entry, so the zeroing is recorded
/// before the archive flag is set.
pub fn archive_batch(
    session: &mut dyn LedgerSession,
    hub_id: i32,
    batch_id: i32,
    operator: Operator,
    note: Option<String>,
    product_archived: bool,
    request_key: Option<String>,
) -> LedgerResult<StockTransaction> {
    let batch = session
        .lock_batch(batch_id, hub_id)?
        .ok_or(LedgerError::NotFound)?;
    if batch.is_archived {
        return Err(LedgerError::BatchArchived { batch_id });
    }

    let mutation = StockMutation::new(
        hub_id,
        batch_id,
        -batch.quantity,
        TransactionKind::Delete,
        operator,
    )
    .with_note(note)
    .with_snapshot(TransactionSnapshot::Delete {
        prior: batch.state(),
        product_archived,
    })
    .with_request_key(request_key);

    let transaction = mutate(session, mutation)?;
    session.set_batch_archived(batch_id, true)?;

    Ok(transaction)
}

/// Transactions `actor` already wrote under `request_key`, if any.
///
/// Keys are scoped to the operator. Entries that do not describe the
/// operation being retried (`fits` returns false) reject the request, and
/// every store they touched must still be writable by `actor`.
pub(crate) fn replay<F>(
    session: &mut dyn LedgerSession,
    registry: &PermissionRegistry,
    actor: &User,
    request_key: Option<&str>,
    fits: F,
) -> LedgerResult<Option<Vec<StockTransaction>>>
where
    F: Fn(&[StockTransaction]) -> bool,
{
    let Some(key) = request_key else {
        return Ok(None);
    };

    let existing = session.find_transactions_by_request_key(actor.hub_id, actor.id, key)?;
    if existing.is_empty() {
        return Ok(None);
    }
    if !fits(&existing) {
        return Err(LedgerError::Validation {
            message: format!("request key {key} was already used for a different operation"),
        });
    }
    for entry in &existing {
        writable_store(session, registry, actor, entry.store_id)?;
    }

    log::info!("Replaying request {key} ({} entries)", existing.len());
    Ok(Some(existing))
}

/// Replay check for operations that write exactly one entry.
fn single_entry(
    entries: &[StockTransaction],
    fits: impl Fn(&StockTransaction) -> bool,
) -> bool {
    matches!(entries, [entry] if fits(entry))
}

/// Load an active store the actor may act on.
pub(crate) fn writable_store(
    session: &mut dyn LedgerSession,
    registry: &PermissionRegistry,
    actor: &User,
    store_id: i32,
) -> LedgerResult<Store> {
    let store = session
        .get_store(store_id, actor.hub_id)?
        .filter(|store| !store.is_archived)
        .ok_or(LedgerError::NotFound)?;

    let rule = registry.get_current(actor.role_level);
    if !can_see_store(actor, &rule, &store) {
        log::warn!("User {} has no access to store {store_id}", actor.id);
        return Err(LedgerError::PermissionDenied { operator_id: None });
    }

    Ok(store)
}

/// Load an active product that may be stocked in `store_id`.
pub(crate) fn stockable_product(
    session: &mut dyn LedgerSession,
    hub_id: i32,
    product_id: i32,
    store_id: i32,
) -> LedgerResult<Product> {
    let product = session
        .get_product(product_id, hub_id)?
        .filter(|product| !product.is_archived)
        .ok_or(LedgerError::NotFound)?;

    if !product.is_visible_in(StoreContext::Store(store_id)) {
        return Err(LedgerError::ProductNotInStore {
            product_id,
            store_id,
        });
    }

    Ok(product)
}

/// Lock a batch and check the actor may touch its store.
fn writable_batch(
    session: &mut dyn LedgerSession,
    registry: &PermissionRegistry,
    actor: &User,
    batch_id: i32,
) -> LedgerResult<Batch> {
    let batch = session
        .lock_batch(batch_id, actor.hub_id)?
        .ok_or(LedgerError::NotFound)?;
    writable_store(session, registry, actor, batch.store_id)?;

    Ok(batch)
}

/// Manual IN, OUT or IMPORT entry against one batch.
#[derive(Debug, Clone)]
pub struct MutationRequest {
    pub batch_id: i32,
    pub delta: i32,
    pub kind: TransactionKind,
    pub note: Option<String>,
    pub request_key: Option<String>,
}

/// Mutate a single batch on behalf of `actor`.
pub fn apply_mutation<R>(
    repo: &R,
    registry: &PermissionRegistry,
    actor: &User,
    request: MutationRequest,
) -> LedgerResult<StockTransaction>
where
    R: LedgerStore + ?Sized,
{
    registry.require(Capability::Edit, actor)?;

    if !matches!(
        request.kind,
        TransactionKind::In | TransactionKind::Out | TransactionKind::Import
    ) {
        return Err(LedgerError::Validation {
            message: format!("{} entries cannot be written directly", request.kind),
        });
    }

    repo.run_in_transaction(|session| {
        writable_batch(session, registry, actor, request.batch_id)?;

        let replayed = replay(
            session,
            registry,
            actor,
            request.request_key.as_deref(),
            |entries| {
                single_entry(entries, |entry| {
                    entry.batch_id == request.batch_id && entry.kind == request.kind
                })
            },
        )?;
        if let Some(mut existing) = replayed {
            return existing.pop().ok_or(LedgerError::NotFound);
        }

        let mutation = StockMutation::new(
            actor.hub_id,
            request.batch_id,
            request.delta,
            request.kind,
            Operator::from(actor),
        )
        .with_note(request.note)
        .with_request_key(request.request_key);

        mutate(session, mutation)
    })
}

/// Opening stock for a new batch.
#[derive(Debug, Clone)]
pub struct CreateBatchRequest {
    pub new_batch: NewBatch,
    pub quantity: i32,
    /// IN or IMPORT.
    pub kind: TransactionKind,
    pub note: Option<String>,
    pub request_key: Option<String>,
}

/// A batch together with the ledger entry that credited it.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReceipt {
    pub batch: Batch,
    pub transaction: StockTransaction,
}

/// Insert an empty batch and credit its opening stock through the ledger.
pub fn create_batch<R>(
    repo: &R,
    registry: &PermissionRegistry,
    actor: &User,
    request: CreateBatchRequest,
) -> LedgerResult<BatchReceipt>
where
    R: LedgerStore + ?Sized,
{
    registry.require(Capability::Edit, actor)?;

    if !matches!(request.kind, TransactionKind::In | TransactionKind::Import) {
        return Err(LedgerError::Validation {
            message: format!("batches open with IN or IMPORT, not {}", request.kind),
        });
    }
    if request.quantity <= 0 {
        return Err(LedgerError::invalid_quantity(request.quantity));
    }
    if request.new_batch.hub_id != actor.hub_id {
        return Err(LedgerError::NotFound);
    }

    repo.run_in_transaction(|session| {
        let store = writable_store(session, registry, actor, request.new_batch.store_id)?;
        stockable_product(session, actor.hub_id, request.new_batch.product_id, store.id)?;

        let replayed = replay(
            session,
            registry,
            actor,
            request.request_key.as_deref(),
            |entries| {
                single_entry(entries, |entry| {
                    entry.kind == request.kind
                        && entry.product_id == request.new_batch.product_id
                        && entry.store_id == store.id
                })
            },
        )?;
        if let Some(mut existing) = replayed {
            let transaction = existing.pop().ok_or(LedgerError::NotFound)?;
            let batch = session
                .lock_batch(transaction.batch_id, actor.hub_id)?
                .ok_or(LedgerError::NotFound)?;
            return Ok(BatchReceipt { batch, transaction });
        }

        let inserted = session.insert_batch(&request.new_batch)?;
        let mutation = StockMutation::new(
            actor.hub_id,
            inserted.id,
            request.quantity,
            request.kind,
            Operator::from(actor),
        )
        .with_note(request.note)
        .with_request_key(request.request_key);

        let transaction = mutate(session, mutation)?;
        let batch = session
            .lock_batch(inserted.id, actor.hub_id)?
            .ok_or(LedgerError::NotFound)?;

        Ok(BatchReceipt { batch, transaction })
    })
}

/// New values for a batch. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct AdjustBatchRequest {
    pub batch_id: i32,
    pub quantity: Option<i32>,
    pub details: UpdateBatchDetails,
    pub note: Option<String>,
    pub request_key: Option<String>,
}

/// Set a batch's quantity and details, recording both sides in an ADJUST entry.
pub fn adjust_batch<R>(
    repo: &R,
    registry: &PermissionRegistry,
    actor: &User,
    request: AdjustBatchRequest,
) -> LedgerResult<StockTransaction>
where
    R: LedgerStore + ?Sized,
{
    registry.require(Capability::Edit, actor)?;

    if let Some(quantity) = request.quantity
        && quantity < 0
    {
        return Err(LedgerError::invalid_quantity(quantity));
    }

    repo.run_in_transaction(|session| {
        let batch = writable_batch(session, registry, actor, request.batch_id)?;

        let replayed = replay(
            session,
            registry,
            actor,
            request.request_key.as_deref(),
            |entries| {
                single_entry(entries, |entry| {
                    entry.batch_id == batch.id && entry.kind == TransactionKind::Adjust
                })
            },
        )?;
        if let Some(mut existing) = replayed {
            return existing.pop().ok_or(LedgerError::NotFound);
        }
        if batch.is_archived {
            return Err(LedgerError::BatchArchived {
                batch_id: batch.id,
            });
        }

        let before = batch.state();
        let mut after = before.clone();
        if let Some(quantity) = request.quantity {
            after.quantity = quantity;
        }
        if let Some(batch_number) = &request.details.batch_number {
            after.batch_number = batch_number.clone();
        }
        if let Some(expiry_date) = request.details.expiry_date {
            after.expiry_date = expiry_date;
        }

        if after == before {
            return Err(LedgerError::Validation {
                message: "adjustment changes nothing".to_string(),
            });
        }

        session.update_batch_details(batch.id, &request.details)?;

        let mutation = StockMutation::new(
            actor.hub_id,
            batch.id,
            after.quantity - before.quantity,
            TransactionKind::Adjust,
            Operator::from(actor),
        )
        .with_note(request.note)
        .with_snapshot(TransactionSnapshot::Adjust { before, after })
        .with_request_key(request.request_key);

        mutate(session, mutation)
    })
}

/// Zero and archive a batch.
pub fn delete_batch<R>(
    repo: &R,
    registry: &PermissionRegistry,
    actor: &User,
    batch_id: i32,
    note: Option<String>,
) -> LedgerResult<StockTransaction>
where
    R: LedgerStore + ?Sized,
{
    registry.require(Capability::Delete, actor)?;

    repo.run_in_transaction(|session| {
        writable_batch(session, registry, actor, batch_id)?;
        archive_batch(
            session,
            actor.hub_id,
            batch_id,
            Operator::from(actor),
            note,
            false,
            None,
        )
    })
}

/// Zero and archive every active batch of a product, then archive the product.
///
/// Returns one DELETE entry per batch; undoing any of them brings the product
/// back together with that batch.
pub fn delete_product<R>(
    repo: &R,
    registry: &PermissionRegistry,
    actor: &User,
    product_id: i32,
    note: Option<String>,
) -> LedgerResult<Vec<StockTransaction>>
where
    R: LedgerStore + ?Sized,
{
    registry.require(Capability::Delete, actor)?;

    repo.run_in_transaction(|session| {
        session
            .get_product(product_id, actor.hub_id)?
            .filter(|product| !product.is_archived)
            .ok_or(LedgerError::NotFound)?;

        let batches = session.query_batches(&BatchQuery::new(actor.hub_id).product(product_id))?;

        let mut transactions = Vec::with_capacity(batches.len());
        for batch in batches {
            writable_store(session, registry, actor, batch.store_id)?;
            transactions.push(archive_batch(
                session,
                actor.hub_id,
                batch.id,
                Operator::from(actor),
                note.clone(),
                true,
                None,
            )?);
        }

        session.set_product_archived(product_id, true)?;
        log::info!(
            "User {} archived product {product_id} with {} batch(es)",
            actor.id,
            transactions.len()
        );

        Ok(transactions)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory::{InMemoryLedger, fixtures};

    fn setup() -> InMemoryLedger {
        let ledger = InMemoryLedger::new();
        ledger.add_store(fixtures::store(1, None));
        ledger.add_store(fixtures::store(2, None));
        ledger.add_product(fixtures::product(10, None));
        ledger.add_batch(fixtures::batch(100, 10, 1, 5, None, 1));
        ledger.add_user(fixtures::user(1, 0, vec![]));
        ledger.add_user(fixtures::user(2, 8, vec![1]));
        ledger.add_user(fixtures::user(3, 9, vec![1]));
        ledger
    }

    fn out(batch_id: i32, delta: i32) -> MutationRequest {
        MutationRequest {
            batch_id,
            delta,
            kind: TransactionKind::Out,
            note: None,
            request_key: None,
        }
    }

    #[test]
    fn mutate_writes_quantity_and_entry() {
        let ledger = setup();
        let registry = PermissionRegistry::new();
        let clerk = ledger.user(2);

        let entry = apply_mutation(&ledger, &registry, &clerk, out(100, -3)).unwrap();

        assert_eq!(entry.kind, TransactionKind::Out);
        assert_eq!(entry.quantity, 3);
        assert_eq!(entry.balance_after, 2);
        assert_eq!(entry.operator.id, 2);
        assert_eq!(
            entry.snapshot,
            TransactionSnapshot::Movement { balance_before: 5 }
        );
        assert_eq!(ledger.batch(100).quantity, 2);
    }

    #[test]
    fn overdraw_leaves_batch_and_log_untouched() {
        let ledger = setup();
        let registry = PermissionRegistry::new();

        let result = apply_mutation(&ledger, &registry, &ledger.user(2), out(100, -6));

        assert!(matches!(
            result,
            Err(LedgerError::InsufficientStock {
                batch_id: Some(100),
                shortfall: 1
            })
        ));
        assert_eq!(ledger.batch(100).quantity, 5);
        assert!(ledger.transactions().is_empty());
    }

    #[test]
    fn non_negativity_holds_over_any_sequence() {
        let ledger = setup();
        let registry = PermissionRegistry::new();
        let clerk = ledger.user(2);

        for delta in [-2, 4, -9, -7, 1, -1, -1, 3, -5, -4] {
            let request = if delta > 0 {
                MutationRequest {
                    kind: TransactionKind::In,
                    ..out(100, delta)
                }
            } else {
                out(100, delta)
            };
            let before = ledger.batch(100).quantity;
            let entries = ledger.transactions().len();

            match apply_mutation(&ledger, &registry, &clerk, request) {
                Ok(entry) => assert_eq!(entry.balance_after, before + delta),
                Err(LedgerError::InsufficientStock { .. }) => {
                    assert_eq!(ledger.batch(100).quantity, before);
                    assert_eq!(ledger.transactions().len(), entries);
                }
                Err(other) => panic!("unexpected error {other:?}"),
            }
            assert!(ledger.batch(100).quantity >= 0);
        }
    }

    #[test]
    fn wrong_sign_is_invalid_quantity() {
        let ledger = setup();
        let registry = PermissionRegistry::new();

        let result = apply_mutation(&ledger, &registry, &ledger.user(2), out(100, 2));

        assert!(matches!(
            result,
            Err(LedgerError::InvalidQuantity { quantity: 2 })
        ));
    }

    #[test]
    fn level_nine_cannot_edit() {
        let ledger = setup();
        let registry = PermissionRegistry::new();

        let result = apply_mutation(&ledger, &registry, &ledger.user(3), out(100, -1));

        assert!(matches!(result, Err(LedgerError::PermissionDenied { .. })));
    }

    #[test]
    fn hidden_store_is_denied() {
        let ledger = setup();
        ledger.add_batch(fixtures::batch(200, 10, 2, 5, None, 1));
        let registry = PermissionRegistry::new();

        let result = apply_mutation(&ledger, &registry, &ledger.user(2), out(200, -1));

        assert!(matches!(result, Err(LedgerError::PermissionDenied { .. })));
        assert_eq!(ledger.batch(200).quantity, 5);
    }

    #[test]
    fn archived_batch_rejects_mutation() {
        let ledger = setup();
        let mut archived = fixtures::batch(300, 10, 1, 5, None, 1);
        archived.is_archived = true;
        ledger.add_batch(archived);
        let registry = PermissionRegistry::new();

        let result = apply_mutation(&ledger, &registry, &ledger.user(1), out(300, -1));

        assert!(matches!(
            result,
            Err(LedgerError::BatchArchived { batch_id: 300 })
        ));
    }

    #[test]
    fn request_key_makes_retries_idempotent() {
        let ledger = setup();
        let registry = PermissionRegistry::new();
        let clerk = ledger.user(2);
        let request = MutationRequest {
            request_key: Some("scan-42".to_string()),
            ..out(100, -2)
        };

        let first = apply_mutation(&ledger, &registry, &clerk, request.clone()).unwrap();
        let second = apply_mutation(&ledger, &registry, &clerk, request).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(ledger.batch(100).quantity, 3);
        assert_eq!(ledger.transactions().len(), 1);
    }

    #[test]
    fn request_keys_are_scoped_to_the_operator() {
        let ledger = setup();
        let registry = PermissionRegistry::new();
        let request = MutationRequest {
            request_key: Some("scan-42".to_string()),
            ..out(100, -2)
        };

        let admin = ledger.user(1);
        let clerk = ledger.user(2);

        let admin_entry = apply_mutation(&ledger, &registry, &admin, request.clone()).unwrap();
        let clerk_entry = apply_mutation(&ledger, &registry, &clerk, request).unwrap();

        assert_ne!(admin_entry.id, clerk_entry.id);
        assert_eq!(clerk_entry.operator.id, 2);
        assert_eq!(ledger.batch(100).quantity, 1);
        assert_eq!(ledger.transactions().len(), 2);
    }

    #[test]
    fn reused_key_for_another_operation_is_rejected() {
        let ledger = setup();
        ledger.add_batch(fixtures::batch(101, 10, 1, 5, None, 2));
        let registry = PermissionRegistry::new();
        let clerk = ledger.user(2);

        apply_mutation(
            &ledger,
            &registry,
            &clerk,
            MutationRequest {
                request_key: Some("scan-42".to_string()),
                ..out(100, -2)
            },
        )
        .unwrap();
        let other_batch = apply_mutation(
            &ledger,
            &registry,
            &clerk,
            MutationRequest {
                request_key: Some("scan-42".to_string()),
                ..out(101, -1)
            },
        );
        let adjustment = adjust_batch(
            &ledger,
            &registry,
            &clerk,
            AdjustBatchRequest {
                batch_id: 100,
                quantity: Some(9),
                details: UpdateBatchDetails::default(),
                note: None,
                request_key: Some("scan-42".to_string()),
            },
        );

        assert!(matches!(other_batch, Err(LedgerError::Validation { .. })));
        assert!(matches!(adjustment, Err(LedgerError::Validation { .. })));
        assert_eq!(ledger.batch(100).quantity, 3);
        assert_eq!(ledger.batch(101).quantity, 5);
        assert_eq!(ledger.transactions().len(), 1);
    }

    #[test]
    fn replay_checks_current_store_scope() {
        let ledger = setup();
        let registry = PermissionRegistry::new();
        let clerk = ledger.user(2);
        let request = MutationRequest {
            request_key: Some("scan-42".to_string()),
            ..out(100, -2)
        };
        apply_mutation(&ledger, &registry, &clerk, request.clone()).unwrap();

        let narrowed = User {
            allowed_store_ids: vec![2],
            ..clerk
        };
        let result = apply_mutation(&ledger, &registry, &narrowed, request);

        assert!(matches!(result, Err(LedgerError::PermissionDenied { .. })));
    }

    #[test]
    fn create_batch_credits_opening_stock() {
        let ledger = setup();
        let registry = PermissionRegistry::new();

        let receipt = create_batch(
            &ledger,
            &registry,
            &ledger.user(2),
            CreateBatchRequest {
                new_batch: NewBatch::new(1, 10, 1).with_batch_number("L-7"),
                quantity: 12,
                kind: TransactionKind::Import,
                note: Some("delivery".to_string()),
                request_key: None,
            },
        )
        .unwrap();

        assert_eq!(receipt.batch.quantity, 12);
        assert_eq!(receipt.batch.batch_number, "L-7");
        assert_eq!(receipt.transaction.kind, TransactionKind::Import);
        assert_eq!(receipt.transaction.batch_id, receipt.batch.id);
        assert_eq!(
            receipt.transaction.snapshot,
            TransactionSnapshot::Movement { balance_before: 0 }
        );
    }

    #[test]
    fn create_batch_respects_product_binding() {
        let ledger = setup();
        ledger.add_product(fixtures::product(11, Some(2)));
        let registry = PermissionRegistry::new();

        let result = create_batch(
            &ledger,
            &registry,
            &ledger.user(1),
            CreateBatchRequest {
                new_batch: NewBatch::new(1, 11, 1),
                quantity: 1,
                kind: TransactionKind::In,
                note: None,
                request_key: None,
            },
        );

        assert!(matches!(
            result,
            Err(LedgerError::ProductNotInStore {
                product_id: 11,
                store_id: 1
            })
        ));
        assert_eq!(ledger.batch_count(), 1);
    }

    #[test]
    fn adjust_records_before_and_after() {
        let ledger = setup();
        let registry = PermissionRegistry::new();

        let entry = adjust_batch(
            &ledger,
            &registry,
            &ledger.user(2),
            AdjustBatchRequest {
                batch_id: 100,
                quantity: Some(8),
                details: UpdateBatchDetails {
                    batch_number: Some("RECOUNT".to_string()),
                    expiry_date: None,
                },
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(entry.kind, TransactionKind::Adjust);
        assert_eq!(entry.quantity, 3);
        let TransactionSnapshot::Adjust { before, after } = entry.snapshot else {
            panic!("expected adjust snapshot");
        };
        assert_eq!(before.quantity, 5);
        assert_eq!(after.quantity, 8);
        assert_eq!(after.batch_number, "RECOUNT");

        let batch = ledger.batch(100);
        assert_eq!(batch.quantity, 8);
        assert_eq!(batch.batch_number, "RECOUNT");
    }

    #[test]
    fn empty_adjustment_is_rejected() {
        let ledger = setup();
        let registry = PermissionRegistry::new();

        let result = adjust_batch(
            &ledger,
            &registry,
            &ledger.user(2),
            AdjustBatchRequest {
                batch_id: 100,
                quantity: Some(5),
                ..Default::default()
            },
        );

        assert!(matches!(result, Err(LedgerError::Validation { .. })));
        assert!(ledger.transactions().is_empty());
    }

    #[test]
    fn delete_batch_zeroes_through_the_ledger_before_archiving() {
        let ledger = setup();
        let registry = PermissionRegistry::new();

        let entry = delete_batch(&ledger, &registry, &ledger.user(1), 100, None).unwrap();

        assert_eq!(entry.kind, TransactionKind::Delete);
        assert_eq!(entry.quantity, 5);
        assert_eq!(entry.balance_after, 0);
        let batch = ledger.batch(100);
        assert!(batch.is_archived);
        assert_eq!(batch.quantity, 0);
    }

    #[test]
    fn delete_requires_delete_capability() {
        let ledger = setup();
        let registry = PermissionRegistry::new();

        let result = delete_batch(&ledger, &registry, &ledger.user(2), 100, None);

        assert!(matches!(result, Err(LedgerError::PermissionDenied { .. })));
        assert!(!ledger.batch(100).is_archived);
    }

    #[test]
    fn delete_product_archives_every_batch() {
        let ledger = setup();
        ledger.add_batch(fixtures::batch(101, 10, 2, 4, None, 2));
        let registry = PermissionRegistry::new();

        let entries = delete_product(&ledger, &registry, &ledger.user(1), 10, None).unwrap();

        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|entry| matches!(
            entry.snapshot,
            TransactionSnapshot::Delete {
                product_archived: true,
                ..
            }
        )));
        assert!(ledger.product(10).is_archived);
        assert!(ledger.batch(101).is_archived);
    }
}
