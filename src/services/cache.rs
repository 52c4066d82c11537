//! Client-side ledger cache
//!
//! Holds the months, wallets and taxonomy the user is looking at, plus the
//! optimistic edits that have not been confirmed yet. Locks are taken and
//! released inside each method, so no guard ever lives across an await.

use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::sync::RwLock;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    BudgetMonth, CategoryId, Money, MonthRef, Taxonomy, Transaction, TransactionId, UserId, Wallet,
};

/// Groups of cached data that are invalidated together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheScope {
    Budgets,
    Wallets,
    Goals,
    Stats,
}

impl CacheScope {
    pub const ALL: [CacheScope; 4] = [Self::Budgets, Self::Wallets, Self::Goals, Self::Stats];
}

/// Point-in-time copy of every mutable cached resource
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheSnapshot {
    months: HashMap<MonthRef, BudgetMonth>,
    taxonomy: Taxonomy,
}

impl CacheSnapshot {
    pub fn month(&self, key: &MonthRef) -> Option<&BudgetMonth> {
        self.months.get(key)
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }
}

fn lock_error(e: impl Display) -> LedgerError {
    LedgerError::Storage(format!("Failed to acquire cache lock: {}", e))
}

#[derive(Debug, Default)]
pub struct LedgerCache {
    months: RwLock<HashMap<MonthRef, BudgetMonth>>,
    wallets: RwLock<Vec<Wallet>>,
    taxonomy: RwLock<Taxonomy>,
    stale: RwLock<HashSet<CacheScope>>,
    active: RwLock<Option<MonthRef>>,
}

impl LedgerCache {
    pub fn new() -> Self {
        Self::default()
    }

    // === Selection ===

    /// Make `key` the month the user is looking at
    pub fn select(&self, key: MonthRef) -> LedgerResult<()> {
        *self.active.write().map_err(lock_error)? = Some(key);
        Ok(())
    }

    pub fn active(&self) -> LedgerResult<Option<MonthRef>> {
        Ok(*self.active.read().map_err(lock_error)?)
    }

    /// Store a fetched month only if it still matches the active selection
    ///
    /// Returns whether the month was accepted.
    pub fn accept_fetch(&self, month: BudgetMonth) -> LedgerResult<bool> {
        if self.active()? != Some(month.month_ref()) {
            return Ok(false);
        }
        self.put_month(month)?;
        self.mark_fresh(CacheScope::Budgets)?;
        Ok(true)
    }

    // === Months ===

    pub fn month(&self, key: &MonthRef) -> LedgerResult<Option<BudgetMonth>> {
        Ok(self.months.read().map_err(lock_error)?.get(key).cloned())
    }

    pub fn put_month(&self, month: BudgetMonth) -> LedgerResult<()> {
        self.months
            .write()
            .map_err(lock_error)?
            .insert(month.month_ref(), month);
        Ok(())
    }

    /// Keys of every cached month belonging to `user`
    pub fn cached_months(&self, user: UserId) -> LedgerResult<Vec<MonthRef>> {
        let months = self.months.read().map_err(lock_error)?;
        Ok(months.keys().filter(|k| k.user_id == user).copied().collect())
    }

    pub fn evict_month(&self, key: &MonthRef) -> LedgerResult<Option<BudgetMonth>> {
        Ok(self.months.write().map_err(lock_error)?.remove(key))
    }

    /// Run `f` against the cached month, creating an empty one if needed
    fn with_month<T>(&self, key: &MonthRef, f: impl FnOnce(&mut BudgetMonth) -> T) -> LedgerResult<T> {
        let mut months = self.months.write().map_err(lock_error)?;
        let month = months
            .entry(*key)
            .or_insert_with(|| BudgetMonth::new(key.user_id, key.key));
        Ok(f(month))
    }

    /// Run `f` against the cached month only if it is cached
    fn with_cached_month<T>(
        &self,
        key: &MonthRef,
        f: impl FnOnce(&mut BudgetMonth) -> Option<T>,
    ) -> LedgerResult<Option<T>> {
        let mut months = self.months.write().map_err(lock_error)?;
        Ok(months.get_mut(key).and_then(f))
    }

    /// Put a transaction at the head of a month's list
    pub fn splice_front(&self, key: &MonthRef, txn: Transaction) -> LedgerResult<()> {
        self.with_month(key, |m| m.insert_front(txn))
    }

    pub fn replace_transaction(&self, key: &MonthRef, txn: Transaction) -> LedgerResult<Option<Transaction>> {
        self.with_cached_month(key, |m| m.replace_transaction(txn))
    }

    pub fn remove_transaction(&self, key: &MonthRef, id: TransactionId) -> LedgerResult<Option<Transaction>> {
        self.with_cached_month(key, |m| m.remove_transaction(id))
    }

    pub fn set_limit(
        &self,
        key: &MonthRef,
        category: &CategoryId,
        limit: Option<Money>,
    ) -> LedgerResult<Option<Money>> {
        self.with_month(key, |m| match limit {
            Some(limit) => m.set_limit(category.clone(), limit),
            None => Ok(m.clear_limit(category)),
        })?
        .map_err(|e| LedgerError::Validation(e.to_string()))
    }

    /// Drop a category's limit entry from every cached month
    pub fn forget_category(&self, category: &CategoryId) -> LedgerResult<usize> {
        let mut months = self.months.write().map_err(lock_error)?;
        Ok(super::limits::forget_category(months.values_mut(), category))
    }

    /// Find a transaction in any cached month of `user`
    pub fn find_transaction(
        &self,
        user: UserId,
        id: TransactionId,
    ) -> LedgerResult<Option<(MonthRef, Transaction)>> {
        let months = self.months.read().map_err(lock_error)?;
        Ok(months
            .iter()
            .filter(|(key, _)| key.user_id == user)
            .find_map(|(key, m)| m.transaction(id).map(|t| (*key, t.clone()))))
    }

    // === Wallets and taxonomy ===

    pub fn wallets(&self) -> LedgerResult<Vec<Wallet>> {
        Ok(self.wallets.read().map_err(lock_error)?.clone())
    }

    pub fn set_wallets(&self, wallets: Vec<Wallet>) -> LedgerResult<()> {
        *self.wallets.write().map_err(lock_error)? = wallets;
        self.mark_fresh(CacheScope::Wallets)
    }

    pub fn taxonomy(&self) -> LedgerResult<Taxonomy> {
        Ok(self.taxonomy.read().map_err(lock_error)?.clone())
    }

    pub fn set_taxonomy(&self, taxonomy: Taxonomy) -> LedgerResult<()> {
        *self.taxonomy.write().map_err(lock_error)? = taxonomy;
        Ok(())
    }

    // === Snapshots ===

    pub fn snapshot(&self) -> LedgerResult<CacheSnapshot> {
        Ok(CacheSnapshot {
            months: self.months.read().map_err(lock_error)?.clone(),
            taxonomy: self.taxonomy()?,
        })
    }

    /// Put every snapshotted resource back exactly as captured
    pub fn restore(&self, snapshot: CacheSnapshot) -> LedgerResult<()> {
        *self.months.write().map_err(lock_error)? = snapshot.months;
        self.set_taxonomy(snapshot.taxonomy)
    }

    // === Staleness ===

    /// Mark every scope stale; cached data stays readable until refetched
    pub fn invalidate_all(&self) -> LedgerResult<()> {
        self.stale
            .write()
            .map_err(lock_error)?
            .extend(CacheScope::ALL);
        Ok(())
    }

    pub fn is_stale(&self, scope: CacheScope) -> LedgerResult<bool> {
        Ok(self.stale.read().map_err(lock_error)?.contains(&scope))
    }

    pub fn mark_fresh(&self, scope: CacheScope) -> LedgerResult<()> {
        self.stale.write().map_err(lock_error)?.remove(&scope);
        Ok(())
    }
}
