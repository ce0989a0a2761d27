//! Live role permission rules shared by every request.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use actix_web::web;
use pushkind_common::repository::errors::RepositoryResult;

use crate::domain::permission::{self, Capability, RolePermissionRule};
use crate::domain::user::User;
use crate::errors::{LedgerError, LedgerResult};
use crate::repository::{RolePermissionReader, RolePermissionWriter};

type Listener = Arc<dyn Fn(&RolePermissionRule) + Send + Sync>;

#[derive(Default)]
struct RegistryInner {
    overrides: RwLock<HashMap<i32, RolePermissionRule>>,
    listeners: Mutex<HashMap<u64, Listener>>,
    next_listener_id: AtomicU64,
}

/// Shared cache of role rules with change subscriptions.
///
/// Every check resolves the current rule for the user's level; nothing holds
/// on to a rule between calls. Cloning yields another handle to the same cache.
#[derive(Clone, Default)]
pub struct PermissionRegistry {
    inner: Arc<RegistryInner>,
}

/// Keeps a listener registered until dropped or explicitly unsubscribed.
#[must_use = "dropping a subscription unsubscribes the listener"]
pub struct Subscription {
    id: u64,
    registry: Weak<RegistryInner>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.registry.upgrade() {
            inner
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&self.id);
        }
    }
}

impl PermissionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current rule for `level`: the stored override if present, otherwise
    /// the built-in bundle. Never fails.
    pub fn get_current(&self, level: i32) -> RolePermissionRule {
        let overrides = self
            .inner
            .overrides
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        match overrides.get(&level) {
            Some(rule) => rule.clone(),
            None => RolePermissionRule::default_for(level),
        }
    }

    /// Register `listener` for every rule change.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&RolePermissionRule) + Send + Sync + 'static,
    {
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(listener));

        Subscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Store `rule` as the override for its level and notify listeners when
    /// it differs from the previous value.
    pub fn publish(&self, rule: RolePermissionRule) {
        let previous = self.get_current(rule.role_level);
        {
            let mut overrides = self
                .inner
                .overrides
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            overrides.insert(rule.role_level, rule.clone());
        }

        if previous != rule {
            log::info!("Permission rule for level {} changed", rule.role_level);
            self.notify(&[rule]);
        }
    }

    /// Replace every override with `rules`, notifying once per level whose
    /// effective rule changed (including levels that fell back to defaults).
    pub fn replace_all(&self, rules: Vec<RolePermissionRule>) {
        let incoming: HashMap<i32, RolePermissionRule> = rules
            .into_iter()
            .map(|rule| (rule.role_level, rule))
            .collect();

        let mut levels: Vec<i32> = {
            let overrides = self
                .inner
                .overrides
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            overrides.keys().chain(incoming.keys()).copied().collect()
        };
        levels.sort_unstable();
        levels.dedup();

        let before: Vec<RolePermissionRule> =
            levels.iter().map(|level| self.get_current(*level)).collect();

        {
            let mut overrides = self
                .inner
                .overrides
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            *overrides = incoming;
        }

        let changed: Vec<RolePermissionRule> = levels
            .iter()
            .zip(before)
            .filter_map(|(level, old)| {
                let current = self.get_current(*level);
                (current != old).then_some(current)
            })
            .collect();

        if !changed.is_empty() {
            log::info!("Permission rules refreshed, {} level(s) changed", changed.len());
            self.notify(&changed);
        }
    }

    /// Poll the stored rules and apply them.
    pub fn refresh<R>(&self, repo: &R) -> RepositoryResult<usize>
    where
        R: RolePermissionReader + ?Sized,
    {
        let rules = repo.list_role_permissions()?;
        let count = rules.len();
        self.replace_all(rules);
        Ok(count)
    }

    /// Evaluate `capability` for `user` against the live rule.
    pub fn evaluate(&self, capability: Capability, user: &User) -> bool {
        let rule = self.get_current(user.role_level);
        permission::evaluate(capability, user.role_level, &rule)
    }

    /// Like [`Self::evaluate`], but turns a denial into `PermissionDenied`.
    pub fn require(&self, capability: Capability, user: &User) -> LedgerResult<()> {
        if self.evaluate(capability, user) {
            Ok(())
        } else {
            log::warn!(
                "User {} (level {}) denied {capability:?}",
                user.id,
                user.role_level
            );
            Err(LedgerError::PermissionDenied { operator_id: None })
        }
    }

    fn notify(&self, rules: &[RolePermissionRule]) {
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();

        for rule in rules {
            for listener in &listeners {
                listener(rule);
            }
        }
    }
}

/// Current rule for `level`. Users may always read their own level; other
/// levels need access to the settings page.
pub fn read_role_permission(
    registry: &PermissionRegistry,
    actor: &User,
    level: i32,
) -> LedgerResult<RolePermissionRule> {
    if level != actor.role_level {
        registry.require(Capability::ViewSettingsPage, actor)?;
    }
    Ok(registry.get_current(level))
}

/// Persist a new rule for its level and publish it to every holder.
pub fn update_role_permission<R>(
    repo: &R,
    registry: &PermissionRegistry,
    actor: &User,
    rule: RolePermissionRule,
) -> LedgerResult<RolePermissionRule>
where
    R: RolePermissionWriter + ?Sized,
{
    registry.require(Capability::ManagePermissions, actor)?;

    let stored = repo.upsert_role_permission(&rule)?;
    registry.publish(stored.clone());
    log::info!(
        "User {} updated permission rule for level {}",
        actor.id,
        stored.role_level
    );

    Ok(stored)
}

/// Refresh `registry` from `repo` on the blocking thread pool.
///
/// Returns the number of stored rules, or `None` when the refresh failed.
pub async fn refresh_blocking<R>(registry: PermissionRegistry, repo: R) -> Option<usize>
where
    R: RolePermissionReader + Send + 'static,
{
    match web::block(move || registry.refresh(&repo)).await {
        Ok(Ok(count)) => {
            log::debug!("Refreshed {count} permission rule overrides");
            Some(count)
        }
        Ok(Err(e)) => {
            log::error!("Failed to refresh permission rules: {e}");
            None
        }
        Err(e) => {
            log::error!("Permission refresh task failed: {e}");
            None
        }
    }
}
