//! Transaction log listing filtered by the viewer's log tier.

use pushkind_common::pagination::DEFAULT_ITEMS_PER_PAGE;
use serde::{Deserialize, Serialize};

use crate::domain::permission::{Capability, LogsLevel, SUPER_ADMIN_LEVEL};
use crate::domain::transaction::{StockTransaction, TransactionListQuery};
use crate::domain::user::{User, UserListQuery};
use crate::repository::{StoreReader, TransactionReader, UserReader};
use crate::services::permissions::PermissionRegistry;
use crate::services::scoping::load_visible_stores;
use crate::services::{ServiceError, ServiceResult};

/// Query parameters accepted by the transaction log.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionsQuery {
    pub page: Option<usize>,
    pub store_id: Option<i32>,
    pub product_id: Option<i32>,
    pub batch_id: Option<i32>,
    /// Hide entries that were undone.
    #[serde(default)]
    pub active_only: bool,
}

/// One page of the transaction log, newest first.
#[derive(Debug, Serialize)]
pub struct TransactionPage {
    pub items: Vec<StockTransaction>,
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
}

/// Narrow `query` to what `tier` may read.
///
/// A sees everything, B the visible stores, C the visible stores limited to
/// its own entries and those of equal or lower privilege, D only its own.
pub fn scope_for_tier(
    query: TransactionListQuery,
    tier: LogsLevel,
    actor: &User,
    visible_store_ids: Vec<i32>,
    subordinate_ids: Vec<i32>,
) -> TransactionListQuery {
    match tier {
        LogsLevel::A => query,
        LogsLevel::B => query.stores(visible_store_ids),
        LogsLevel::C => {
            let mut operators = subordinate_ids;
            if !operators.contains(&actor.id) {
                operators.push(actor.id);
            }
            query.stores(visible_store_ids).operators(operators)
        }
        LogsLevel::D => query.operators(vec![actor.id]),
    }
}

/// Loads one page of the transaction log for the actor.
pub fn load_transactions<R>(
    repo: &R,
    registry: &PermissionRegistry,
    actor: &User,
    query: TransactionsQuery,
) -> ServiceResult<TransactionPage>
where
    R: TransactionReader + StoreReader + UserReader + ?Sized,
{
    if !registry.evaluate(Capability::ViewLogsPage, actor) {
        return Err(ServiceError::Unauthorized);
    }

    let page = query.page.unwrap_or(1);
    let mut list_query =
        TransactionListQuery::new(actor.hub_id).paginate(page, DEFAULT_ITEMS_PER_PAGE);

    if let Some(product_id) = query.product_id {
        list_query = list_query.product(product_id);
    }
    if let Some(batch_id) = query.batch_id {
        list_query = list_query.batch(batch_id);
    }
    if query.active_only {
        list_query = list_query.active_only();
    }

    let tier = if actor.role_level == SUPER_ADMIN_LEVEL {
        LogsLevel::A
    } else {
        registry.get_current(actor.role_level).logs_level
    };

    let visible_store_ids: Vec<i32> = match tier {
        LogsLevel::B | LogsLevel::C => load_visible_stores(repo, registry, actor)?
            .iter()
            .map(|store| store.id)
            .collect(),
        LogsLevel::A | LogsLevel::D => Vec::new(),
    };

    let subordinate_ids: Vec<i32> = if tier == LogsLevel::C {
        let (_, users) = repo
            .list_users(UserListQuery::new(actor.hub_id).min_role_level(actor.role_level))
            .map_err(ServiceError::from)?;
        users.iter().map(|user| user.id).collect()
    } else {
        Vec::new()
    };

    let mut list_query =
        scope_for_tier(list_query, tier, actor, visible_store_ids, subordinate_ids);

    if let Some(store_id) = query.store_id {
        let allowed = list_query
            .store_ids
            .as_ref()
            .is_none_or(|ids| ids.contains(&store_id));
        list_query.store_ids = Some(if allowed { vec![store_id] } else { Vec::new() });
    }

    let (total, items) = repo
        .list_transactions(list_query)
        .map_err(ServiceError::from)?;

    Ok(TransactionPage {
        items,
        page,
        total_pages: total.div_ceil(DEFAULT_ITEMS_PER_PAGE),
        total,
    })
}
