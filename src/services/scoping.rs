//! Visibility filters for stores and products.
//!
//! Scoping only decides what a user may see. Ledger and undo authority checks
//! still apply to anything that passes these filters.

use std::collections::HashMap;

use pushkind_common::services::errors::{ServiceError, ServiceResult};

use crate::domain::permission::{RolePermissionRule, SUPER_ADMIN_LEVEL, StoreScope};
use crate::domain::product::{Product, ProductListQuery};
use crate::domain::store::{Store, StoreContext, StoreNode};
use crate::domain::user::User;
use crate::repository::{ProductReader, StoreReader};
use crate::services::permissions::PermissionRegistry;

/// Whether `user`, holding `rule`, may see `store`.
pub fn can_see_store(user: &User, rule: &RolePermissionRule, store: &Store) -> bool {
    if user.role_level == SUPER_ADMIN_LEVEL || rule.store_scope == StoreScope::Global {
        return true;
    }

    user.allowed_store_ids.contains(&store.id) || store.has_member(user.id)
}

/// Stores from `all_stores` that `user` may see, in input order.
pub fn visible_stores(user: &User, rule: &RolePermissionRule, all_stores: &[Store]) -> Vec<Store> {
    all_stores
        .iter()
        .filter(|store| can_see_store(user, rule, store))
        .cloned()
        .collect()
}

/// Products visible in `context`. `StoreContext::All` applies no binding filter.
pub fn visible_products(products: &[Product], context: StoreContext) -> Vec<Product> {
    products
        .iter()
        .filter(|product| product.is_visible_in(context))
        .cloned()
        .collect()
}

/// Group `stores` into parent nodes with their children.
///
/// A store whose parent is not part of `stores` becomes a root of its own.
pub fn store_tree(stores: &[Store]) -> Vec<StoreNode> {
    let known: Vec<i32> = stores.iter().map(|store| store.id).collect();
    let mut children: HashMap<i32, Vec<Store>> = HashMap::new();
    let mut roots = Vec::new();

    for store in stores {
        match store.parent_id {
            Some(parent_id) if parent_id != store.id && known.contains(&parent_id) => {
                children.entry(parent_id).or_default().push(store.clone());
            }
            _ => roots.push(store.clone()),
        }
    }

    roots
        .into_iter()
        .map(|store| StoreNode {
            children: children.remove(&store.id).unwrap_or_default(),
            store,
        })
        .collect()
}

/// Active stores of the actor's hub filtered by the live rule for their level.
pub fn load_visible_stores<R>(
    repo: &R,
    registry: &PermissionRegistry,
    actor: &User,
) -> ServiceResult<Vec<Store>>
where
    R: StoreReader + ?Sized,
{
    let stores = repo.list_stores(actor.hub_id).map_err(ServiceError::from)?;

    let active: Vec<Store> = stores.into_iter().filter(|store| !store.is_archived).collect();
    let rule = registry.get_current(actor.role_level);

    Ok(visible_stores(actor, &rule, &active))
}

/// Store tree of everything the actor may see.
pub fn load_store_tree<R>(
    repo: &R,
    registry: &PermissionRegistry,
    actor: &User,
) -> ServiceResult<Vec<StoreNode>>
where
    R: StoreReader + ?Sized,
{
    let stores = load_visible_stores(repo, registry, actor)?;
    Ok(store_tree(&stores))
}

/// Resolve `context` for the actor, refusing stores they cannot see.
pub fn ensure_context_visible<R>(
    repo: &R,
    registry: &PermissionRegistry,
    actor: &User,
    context: StoreContext,
) -> ServiceResult<()>
where
    R: StoreReader + ?Sized,
{
    let Some(store_id) = context.store_id() else {
        return Ok(());
    };

    let visible = load_visible_stores(repo, registry, actor)?;
    if visible.iter().any(|store| store.id == store_id) {
        Ok(())
    } else {
        log::warn!("User {} requested hidden store {store_id}", actor.id);
        Err(ServiceError::NotFound)
    }
}

/// Active products visible in `context` for the actor.
pub fn load_visible_products<R>(
    repo: &R,
    registry: &PermissionRegistry,
    actor: &User,
    context: StoreContext,
    search: Option<&str>,
) -> ServiceResult<Vec<Product>>
where
    R: StoreReader + ProductReader + ?Sized,
{
    ensure_context_visible(repo, registry, actor, context)?;

    let mut query = ProductListQuery::new(actor.hub_id);
    if let Some(term) = search.map(str::trim).filter(|term| !term.is_empty()) {
        query = query.search(term);
    }

    let (_total, products) = repo.list_products(query).map_err(ServiceError::from)?;

    Ok(visible_products(&products, context))
}
