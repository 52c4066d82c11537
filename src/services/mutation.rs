//! Optimistic mutation coordinator
//!
//! Every change to ledger state goes through here. The change is applied to
//! the cache first so the user sees it immediately, then written to the
//! backend. A failed write puts back the snapshot taken before the change and
//! queues a recoverable error notification; a successful one queues a success
//! notification. Whatever the outcome, the cache is then marked stale and
//! everything in it is refetched: wallets, the taxonomy and each cached month.
//! That replaces provisional records with the backend's canonical ones. A
//! month other than the active one that cannot be refetched is dropped from
//! the cache rather than kept with unconfirmed edits.
//!
//! Overlapping mutations each restore their own snapshot on failure; the
//! month refetch that follows settles any disagreement.

use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::Utc;

use crate::audit::{diff_fields, AuditDetail, AuditEvent, AuditSink, ChangeType, EntityType};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    BudgetMonth, Category, CategoryId, Money, MonthKey, MonthRef, Taxonomy,
    Transaction, TransactionId, UserId,
};
use crate::storage::LedgerBackend;

use super::aggregate::Aggregator;
use super::cache::{CacheSnapshot, LedgerCache};
use super::classify::ClassificationRules;
use super::notifications::{Notification, NotificationQueue};
use super::rate_limit::RateLimiter;

/// Lifecycle of a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    Idle,
    Pending,
    Committed,
    RolledBack,
}

impl MutationState {
    pub fn can_transition_to(&self, next: MutationState) -> bool {
        use MutationState::*;
        matches!(
            (self, next),
            (Idle, Pending)
                | (Pending, Committed)
                | (Pending, RolledBack)
                | (Committed, Idle)
                | (RolledBack, Idle)
        )
    }
}

pub struct MutationCoordinator<B: LedgerBackend> {
    user: UserId,
    backend: Arc<B>,
    cache: Arc<LedgerCache>,
    audit: Arc<dyn AuditSink>,
    notifications: Arc<NotificationQueue>,
    invalidation_delay: Duration,
    limiter: Option<RateLimiter>,
    state: RwLock<MutationState>,
}

impl<B: LedgerBackend> MutationCoordinator<B> {
    pub fn new(
        user: UserId,
        backend: Arc<B>,
        cache: Arc<LedgerCache>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            user,
            backend,
            cache,
            audit,
            notifications: Arc::new(NotificationQueue::new()),
            invalidation_delay: Duration::ZERO,
            limiter: None,
            state: RwLock::new(MutationState::Idle),
        }
    }

    /// Wait this long after a settle before invalidating
    pub fn with_invalidation_delay(mut self, delay: Duration) -> Self {
        self.invalidation_delay = delay;
        self
    }

    /// Limit mutations per user
    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = Some(limiter);
        self
    }

    pub fn user(&self) -> UserId {
        self.user
    }

    pub fn cache(&self) -> &LedgerCache {
        &self.cache
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    pub fn state(&self) -> MutationState {
        self.state
            .read()
            .map(|s| *s)
            .unwrap_or(MutationState::Idle)
    }

    // === Reads ===

    /// Select `month`, load reference data and fetch the month
    pub async fn load(&self, month: MonthKey) -> LedgerResult<BudgetMonth> {
        let key = MonthRef::new(self.user, month);
        self.cache.select(key)?;
        self.refresh_reference_data().await?;
        self.fetch_month(&key).await?.ok_or_else(|| {
            LedgerError::CacheInconsistency(format!("selection changed while loading {}", key))
        })
    }

    /// Reload wallets and the custom categories
    pub async fn refresh_reference_data(&self) -> LedgerResult<()> {
        let wallets = self.backend.list_wallets(self.user).await?;
        self.cache.set_wallets(wallets)?;
        let custom = self.backend.list_custom_categories(self.user).await?;
        self.cache.set_taxonomy(Taxonomy::with_custom(custom))
    }

    /// Fetch a month; `None` when the selection moved on before it arrived
    pub async fn fetch_month(&self, key: &MonthRef) -> LedgerResult<Option<BudgetMonth>> {
        let month = self.backend.fetch_month(key).await?;
        if self.cache.active()? != Some(*key) || !self.cache.accept_fetch(month.clone())? {
            tracing::debug!(month = %key, "discarding stale month response");
            return Ok(None);
        }
        Ok(Some(month))
    }

    // === Transactions ===

    /// Create a transaction, returning the canonical record
    pub async fn submit_create(&self, txn: Transaction) -> LedgerResult<Transaction> {
        txn.validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;
        self.admit()?;

        let key = MonthRef::new(self.user, txn.month());
        let provisional = txn.provisional_copy();

        let (created, before) = self
            .optimistic(
                ("save transaction", "Transaction saved"),
                |cache| cache.splice_front(&key, provisional),
                self.backend.create_transaction(&key, &txn),
            )
            .await?;

        let event = AuditEvent::new(EntityType::Transaction, &created.name, ChangeType::Create)
            .with_amount_delta(created.actual_amount)
            .with_detail(transaction_detail(&created, &key, Vec::new()));
        self.emit(self.with_balances(event, &key, &before)).await;

        Ok(created)
    }

    /// Replace a transaction, moving it when its date lands in another month
    pub async fn submit_update(&self, txn: Transaction) -> LedgerResult<Transaction> {
        txn.validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;
        self.admit()?;

        let (old_key, old) = self.locate(txn.id).await?;
        let new_key = MonthRef::new(self.user, txn.month());
        let provisional = Transaction {
            provisional: true,
            ..txn.clone()
        };

        let (updated, before) = self
            .optimistic(
                ("update transaction", "Transaction updated"),
                |cache| {
                    if old_key != new_key {
                        cache.remove_transaction(&old_key, provisional.id)?;
                        return cache.splice_front(&new_key, provisional);
                    }
                    if cache
                        .replace_transaction(&new_key, provisional.clone())?
                        .is_none()
                    {
                        cache.splice_front(&new_key, provisional)?;
                    }
                    Ok(())
                },
                self.backend.update_transaction(self.user, &txn),
            )
            .await?;

        let changes = diff_fields(
            &serde_json::to_value(&old).unwrap_or_default(),
            &serde_json::to_value(&updated).unwrap_or_default(),
        );
        let event = AuditEvent::new(EntityType::Transaction, &updated.name, ChangeType::Update)
            .with_amount_delta(updated.actual_amount - old.actual_amount)
            .with_detail(transaction_detail(&updated, &new_key, changes));
        self.emit(self.with_balances(event, &new_key, &before)).await;

        Ok(updated)
    }

    /// Delete a transaction, returning the removed record
    pub async fn submit_delete(&self, id: TransactionId) -> LedgerResult<Transaction> {
        self.admit()?;
        let (key, _) = self.locate(id).await?;

        let (removed, before) = self
            .optimistic(
                ("delete transaction", "Transaction deleted"),
                |cache| cache.remove_transaction(&key, id).map(|_| ()),
                self.backend.delete_transaction(self.user, id),
            )
            .await?;

        let event = AuditEvent::new(EntityType::Transaction, &removed.name, ChangeType::Delete)
            .with_amount_delta(-removed.actual_amount)
            .with_detail(transaction_detail(&removed, &key, Vec::new()));
        self.emit(self.with_balances(event, &key, &before)).await;

        Ok(removed)
    }

    // === Limits and categories ===

    /// Set (`Some`) or clear (`None`) a category limit for a month
    ///
    /// Returns the previous entry as seen by the cache.
    pub async fn submit_limit(
        &self,
        month: MonthKey,
        category: &CategoryId,
        limit: Option<Money>,
    ) -> LedgerResult<Option<Money>> {
        if limit.map_or(false, |l| l.is_negative()) {
            return Err(LedgerError::Validation(
                "Category limit cannot be negative".into(),
            ));
        }
        let category = match limit {
            Some(_) => self
                .cache
                .taxonomy()?
                .get(category)
                .map(|c| c.id)
                .ok_or_else(|| LedgerError::category_not_found(category.to_string()))?,
            // clearing works for stale ids too
            None => category.clone(),
        };
        self.admit()?;

        let key = MonthRef::new(self.user, month);
        let previous = self
            .cache
            .month(&key)?
            .and_then(|m| m.limit(&category));

        self.optimistic(
            ("update limit", "Limit updated"),
            |cache| cache.set_limit(&key, &category, limit).map(|_| ()),
            self.backend.set_category_limit(&key, &category, limit),
        )
        .await?;

        let change_type = match (previous, limit) {
            (None, Some(_)) => ChangeType::Create,
            (Some(_), None) => ChangeType::Delete,
            _ => ChangeType::Update,
        };
        let event = AuditEvent::new(EntityType::BudgetLimit, category.as_str(), change_type)
            .with_detail(AuditDetail::Limit {
                category: category.to_string(),
                month: month.to_string(),
                previous,
                limit,
            });
        self.emit(event).await;

        Ok(previous)
    }

    pub async fn submit_add_category(&self, category: Category) -> LedgerResult<Category> {
        category
            .validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;
        let mut taxonomy = self.cache.taxonomy()?;
        taxonomy
            .add_custom(category.clone())
            .map_err(LedgerError::from)?;
        self.admit()?;

        let (added, _) = self
            .optimistic(
                ("add category", "Category added"),
                |cache| cache.set_taxonomy(taxonomy),
                self.backend.add_custom_category(self.user, &category),
            )
            .await?;

        let event = AuditEvent::new(EntityType::Category, &added.label, ChangeType::Create)
            .with_detail(AuditDetail::Category {
                semantic_type: added.semantic_type,
            });
        self.emit(event).await;

        Ok(added)
    }

    /// Remove a custom category; its limit entries go with it
    pub async fn submit_remove_category(&self, id: &CategoryId) -> LedgerResult<Category> {
        let mut taxonomy = self.cache.taxonomy()?;
        let doomed = taxonomy.remove_custom(id).map_err(LedgerError::from)?;
        self.admit()?;

        let (removed, _) = self
            .optimistic(
                ("remove category", "Category removed"),
                |cache| {
                    cache.set_taxonomy(taxonomy)?;
                    cache.forget_category(&doomed.id).map(|_| ())
                },
                self.backend.remove_custom_category(self.user, id),
            )
            .await?;

        let event = AuditEvent::new(EntityType::Category, &removed.label, ChangeType::Delete)
            .with_detail(AuditDetail::Category {
                semantic_type: removed.semantic_type,
            });
        self.emit(event).await;

        Ok(removed)
    }

    // === Protocol ===

    /// Apply `apply` to the cache, then await `remote`
    ///
    /// `labels` is the action as it reads in a failure ("save transaction")
    /// and in a success notification ("Transaction saved"). On failure the
    /// cache is put back to the snapshot taken before `apply`. Returns the
    /// remote result and that snapshot.
    async fn optimistic<T>(
        &self,
        labels: (&str, &str),
        apply: impl FnOnce(&LedgerCache) -> LedgerResult<()>,
        remote: impl Future<Output = LedgerResult<T>>,
    ) -> LedgerResult<(T, CacheSnapshot)> {
        let (action, done) = labels;
        let snapshot = self.cache.snapshot()?;
        self.transition(MutationState::Pending);

        let result = match apply(self.cache.as_ref()) {
            Ok(()) => remote.await,
            Err(e) => Err(e),
        };

        let result = match result {
            Ok(value) => {
                self.transition(MutationState::Committed);
                tracing::info!(action, user = %self.user, "mutation committed");
                self.notifications.push(Notification::success(done));
                Ok((value, snapshot))
            }
            Err(e) => {
                tracing::warn!(action, error = %e, "mutation failed, rolling back");
                if let Err(restore_err) = self.cache.restore(snapshot) {
                    tracing::warn!(error = %restore_err, "cache restore failed");
                }
                self.notifications
                    .push(Notification::error(format!("Could not {}: {}", action, e)));
                self.transition(MutationState::RolledBack);
                Err(e)
            }
        };

        self.settle().await;
        self.transition(MutationState::Idle);
        result
    }

    /// Invalidate after a mutation and refetch everything cached
    async fn settle(&self) {
        if !self.invalidation_delay.is_zero() {
            tokio::time::sleep(self.invalidation_delay).await;
        }

        if let Err(e) = self.cache.invalidate_all() {
            tracing::warn!(error = %e, "cache invalidation failed");
            return;
        }

        if let Err(e) = self.refresh_reference_data().await {
            tracing::warn!(error = %e, "reference data refetch failed");
        }

        let (active, cached) = match (self.cache.active(), self.cache.cached_months(self.user)) {
            (Ok(active), Ok(cached)) => (active, cached),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, "could not read cached months");
                return;
            }
        };

        for key in cached.iter().filter(|k| Some(**k) != active) {
            self.refetch_inactive(key).await;
        }

        if let Some(active) = active {
            if let Err(e) = self.fetch_month(&active).await {
                tracing::warn!(month = %active, error = %e, "refetch after mutation failed");
                self.notifications.push(Notification::info(format!(
                    "Could not refresh {}; showing cached data",
                    active.key
                )));
            }
        }
    }

    /// Replace a cached month that is not on screen, or drop it on failure
    async fn refetch_inactive(&self, key: &MonthRef) {
        let outcome = match self.backend.fetch_month(key).await {
            Ok(month) => self.cache.put_month(month),
            Err(e) => {
                tracing::debug!(month = %key, error = %e, "dropping month that could not be refetched");
                self.cache.evict_month(key).map(|_| ())
            }
        };
        if let Err(e) = outcome {
            tracing::warn!(month = %key, error = %e, "cache update after refetch failed");
        }
    }

    fn transition(&self, next: MutationState) {
        if let Ok(mut state) = self.state.write() {
            if !state.can_transition_to(next) {
                tracing::debug!(from = ?*state, to = ?next, "overlapping mutation");
            }
            *state = next;
        }
    }

    fn admit(&self) -> LedgerResult<()> {
        let Some(limiter) = &self.limiter else {
            return Ok(());
        };
        limiter
            .check(&self.user.to_string(), Utc::now())
            .map_err(|e| {
                self.notifications.push(Notification::warning(e.to_string()));
                e
            })
    }

    /// Find a transaction in the cache, falling back to the backend
    async fn locate(&self, id: TransactionId) -> LedgerResult<(MonthRef, Transaction)> {
        if let Some(found) = self.cache.find_transaction(self.user, id)? {
            return Ok(found);
        }
        self.backend.find_transaction(self.user, id).await
    }

    async fn emit(&self, event: AuditEvent) {
        if let Err(e) = self.audit.record(&event).await {
            tracing::warn!(error = %e, entity = %event.entity_name, "audit write failed");
        }
    }

    /// Attach the month's flow balance before and after the change
    fn with_balances(&self, event: AuditEvent, key: &MonthRef, before: &CacheSnapshot) -> AuditEvent {
        let balances = (|| -> LedgerResult<(Money, Money)> {
            let taxonomy = self.cache.taxonomy()?;
            let wallets = self.cache.wallets()?;
            let aggregator = Aggregator::new(ClassificationRules::new(&taxonomy));
            let balance = |month: Option<&BudgetMonth>| {
                month
                    .map(|m| aggregator.aggregate(m.key(), &m.transactions, &wallets).balance)
                    .unwrap_or_default()
            };
            let after = self.cache.month(key)?;
            Ok((balance(before.month(key)), balance(after.as_ref())))
        })();

        match balances {
            Ok((previous, new)) => event.with_balances(previous, new),
            Err(_) => event,
        }
    }
}

fn transaction_detail(
    txn: &Transaction,
    key: &MonthRef,
    changes: Vec<crate::audit::FieldChange>,
) -> AuditDetail {
    AuditDetail::Transaction {
        transaction_id: txn.id.to_string(),
        category: txn.category.to_string(),
        month: key.key.to_string(),
        changes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditSink;
    use crate::models::{SemanticType, TransactionKind, Wallet, WalletId, WalletType};
    use crate::services::cache::CacheScope;
    use crate::services::notifications::NotificationType;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct MockBackend {
        months: Mutex<HashMap<MonthRef, BudgetMonth>>,
        wallets: Vec<Wallet>,
        custom: Mutex<Vec<Category>>,
        fail_writes: AtomicBool,
        writes: AtomicUsize,
        gate: Option<Arc<Notify>>,
        /// Creates of the transaction with this name wait for the notify
        hold: Option<(String, Arc<Notify>)>,
        unreachable: Mutex<HashSet<MonthRef>>,
    }

    impl MockBackend {
        fn write_attempt(&self) -> LedgerResult<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(LedgerError::Network("connection reset".into()));
            }
            Ok(())
        }

        fn seed(&self, month: BudgetMonth) {
            self.months.lock().unwrap().insert(month.month_ref(), month);
        }

        fn month(&self, key: &MonthRef) -> Option<BudgetMonth> {
            self.months.lock().unwrap().get(key).cloned()
        }
    }

    #[async_trait]
    impl LedgerBackend for MockBackend {
        async fn fetch_month(&self, key: &MonthRef) -> LedgerResult<BudgetMonth> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.unreachable.lock().unwrap().contains(key) {
                return Err(LedgerError::Network("timed out".into()));
            }
            let mut months = self.months.lock().unwrap();
            Ok(months
                .entry(*key)
                .or_insert_with(|| BudgetMonth::new(key.user_id, key.key))
                .clone())
        }

        async fn list_wallets(&self, _user: UserId) -> LedgerResult<Vec<Wallet>> {
            Ok(self.wallets.clone())
        }

        async fn list_custom_categories(&self, _user: UserId) -> LedgerResult<Vec<Category>> {
            Ok(self.custom.lock().unwrap().clone())
        }

        async fn create_transaction(
            &self,
            key: &MonthRef,
            txn: &Transaction,
        ) -> LedgerResult<Transaction> {
            if let Some((name, gate)) = &self.hold {
                if &txn.name == name {
                    gate.notified().await;
                }
            }
            self.write_attempt()?;
            let canonical = Transaction {
                id: TransactionId::new(),
                timestamp: Some(Utc::now()),
                ..txn.clone()
            };
            let mut months = self.months.lock().unwrap();
            months
                .entry(*key)
                .or_insert_with(|| BudgetMonth::new(key.user_id, key.key))
                .insert_front(canonical.clone());
            Ok(canonical)
        }

        async fn update_transaction(
            &self,
            user: UserId,
            txn: &Transaction,
        ) -> LedgerResult<Transaction> {
            self.write_attempt()?;
            let mut months = self.months.lock().unwrap();
            let removed = months
                .values_mut()
                .find_map(|m| m.remove_transaction(txn.id));
            if removed.is_none() {
                return Err(LedgerError::transaction_not_found(txn.id.to_string()));
            }
            let key = MonthRef::new(user, txn.month());
            months
                .entry(key)
                .or_insert_with(|| BudgetMonth::new(user, key.key))
                .insert_front(txn.clone());
            Ok(txn.clone())
        }

        async fn delete_transaction(
            &self,
            _user: UserId,
            id: TransactionId,
        ) -> LedgerResult<Transaction> {
            self.write_attempt()?;
            let mut months = self.months.lock().unwrap();
            months
                .values_mut()
                .find_map(|m| m.remove_transaction(id))
                .ok_or_else(|| LedgerError::transaction_not_found(id.to_string()))
        }

        async fn find_transaction(
            &self,
            _user: UserId,
            id: TransactionId,
        ) -> LedgerResult<(MonthRef, Transaction)> {
            let months = self.months.lock().unwrap();
            months
                .iter()
                .find_map(|(k, m)| m.transaction(id).map(|t| (*k, t.clone())))
                .ok_or_else(|| LedgerError::transaction_not_found(id.to_string()))
        }

        async fn set_category_limit(
            &self,
            key: &MonthRef,
            category: &CategoryId,
            limit: Option<Money>,
        ) -> LedgerResult<BudgetMonth> {
            self.write_attempt()?;
            let mut months = self.months.lock().unwrap();
            let month = months
                .entry(*key)
                .or_insert_with(|| BudgetMonth::new(key.user_id, key.key));
            match limit {
                Some(limit) => {
                    month.set_limit(category.clone(), limit).unwrap();
                }
                None => {
                    month.clear_limit(category);
                }
            }
            Ok(month.clone())
        }

        async fn add_custom_category(
            &self,
            _user: UserId,
            category: &Category,
        ) -> LedgerResult<Category> {
            self.write_attempt()?;
            self.custom.lock().unwrap().push(category.clone());
            Ok(category.clone())
        }

        async fn remove_custom_category(
            &self,
            _user: UserId,
            id: &CategoryId,
        ) -> LedgerResult<Category> {
            self.write_attempt()?;
            let mut custom = self.custom.lock().unwrap();
            let index = custom
                .iter()
                .position(|c| &c.id == id)
                .ok_or_else(|| LedgerError::category_not_found(id.to_string()))?;
            for month in self.months.lock().unwrap().values_mut() {
                month.clear_limit(id);
            }
            Ok(custom.remove(index))
        }
    }

    struct FailingSink;

    #[async_trait]
    impl AuditSink for FailingSink {
        async fn record(&self, _event: &AuditEvent) -> LedgerResult<()> {
            Err(LedgerError::Io("disk full".into()))
        }
    }

    fn jan() -> MonthKey {
        MonthKey::new(2025, 1).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn txn(name: &str, category: &str, cents: i64) -> Transaction {
        Transaction::new(name, category, Money::from_cents(cents), day(10), WalletId::new())
    }

    struct Harness {
        user: UserId,
        backend: Arc<MockBackend>,
        audit: Arc<MemoryAuditSink>,
        coordinator: MutationCoordinator<MockBackend>,
    }

    fn harness(backend: MockBackend) -> Harness {
        let user = UserId::new();
        let backend = Arc::new(backend);
        let audit = Arc::new(MemoryAuditSink::new());
        let coordinator = MutationCoordinator::new(
            user,
            backend.clone(),
            Arc::new(LedgerCache::new()),
            audit.clone(),
        );
        Harness {
            user,
            backend,
            audit,
            coordinator,
        }
    }

    /// A harness whose January already holds a paycheck
    async fn loaded() -> (Harness, Transaction) {
        let h = harness(MockBackend::default());
        let mut month = BudgetMonth::new(h.user, jan());
        let paycheck = txn("Salary", "Paycheck", 300_000);
        month.push(paycheck.clone());
        h.backend.seed(month);
        h.coordinator.load(jan()).await.unwrap();
        (h, paycheck)
    }

    #[test]
    fn test_state_transitions() {
        use MutationState::*;
        assert!(Idle.can_transition_to(Pending));
        assert!(Pending.can_transition_to(Committed));
        assert!(Pending.can_transition_to(RolledBack));
        assert!(Committed.can_transition_to(Idle));
        assert!(RolledBack.can_transition_to(Idle));
        assert!(!Idle.can_transition_to(Committed));
        assert!(!Committed.can_transition_to(RolledBack));
    }

    #[tokio::test]
    async fn test_failed_create_restores_cache() {
        let (h, _) = loaded().await;
        let before = h.coordinator.cache().snapshot().unwrap();
        h.backend.fail_writes.store(true, Ordering::SeqCst);

        let err = h
            .coordinator
            .submit_create(txn("Groceries", "Food", 5_000))
            .await
            .unwrap_err();

        assert!(err.is_network());
        assert_eq!(h.coordinator.cache().snapshot().unwrap(), before);
        assert_eq!(h.coordinator.state(), MutationState::Idle);

        let note = h.coordinator.notifications().latest().unwrap();
        assert_eq!(note.notification_type, NotificationType::Error);
        assert!(note.recoverable);
        assert!(h.audit.events().is_empty());
    }

    #[tokio::test]
    async fn test_failed_create_restores_uncached_month() {
        let h = harness(MockBackend::default());
        h.backend.fail_writes.store(true, Ordering::SeqCst);

        let t = txn("Groceries", "Food", 5_000);
        let key = MonthRef::new(h.user, t.month());
        assert!(h.coordinator.submit_create(t).await.is_err());
        assert!(h.coordinator.cache().month(&key).unwrap().is_none());
        assert_eq!(h.coordinator.cache().snapshot().unwrap(), CacheSnapshot::default());
    }

    #[tokio::test]
    async fn test_create_superseded_by_refetch() {
        let (h, _) = loaded().await;
        let draft = txn("Groceries", "Food", 5_000);

        let created = h.coordinator.submit_create(draft.clone()).await.unwrap();
        assert_ne!(created.id, draft.id);
        assert!(created.timestamp.is_some());

        let note = h.coordinator.notifications().latest().unwrap();
        assert_eq!(note.notification_type, NotificationType::Success);
        assert_eq!(note.message, "Transaction saved");

        let key = MonthRef::new(h.user, jan());
        let cached = h.coordinator.cache().month(&key).unwrap().unwrap();
        assert_eq!(cached.transactions.len(), 2);
        assert_eq!(cached.transactions[0].id, created.id);
        assert!(cached.transactions.iter().all(|t| !t.provisional));
        assert_eq!(Some(cached), h.backend.month(&key));

        let events = h.audit.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].change_type, ChangeType::Create);
        assert_eq!(events[0].amount_delta, Some(Money::from_cents(5_000)));
        assert_eq!(events[0].previous_balance, Some(Money::from_cents(300_000)));
        assert_eq!(events[0].new_balance, Some(Money::from_cents(295_000)));
    }

    #[tokio::test]
    async fn test_validation_rejected_before_cache() {
        let (h, _) = loaded().await;
        let before = h.coordinator.cache().snapshot().unwrap();

        let err = h
            .coordinator
            .submit_create(txn("   ", "Food", 100))
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let transfer_without_destination =
            txn("Move", "Other", 100).with_kind(TransactionKind::Transfer);
        assert!(h
            .coordinator
            .submit_create(transfer_without_destination)
            .await
            .unwrap_err()
            .is_validation());

        assert_eq!(h.coordinator.cache().snapshot().unwrap(), before);
        assert_eq!(h.backend.writes.load(Ordering::SeqCst), 0);
        assert!(h.coordinator.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_failing_audit_does_not_block() {
        let user = UserId::new();
        let backend = Arc::new(MockBackend::default());
        let coordinator = MutationCoordinator::new(
            user,
            backend.clone(),
            Arc::new(LedgerCache::new()),
            Arc::new(FailingSink),
        );
        coordinator.load(jan()).await.unwrap();

        let created = coordinator
            .submit_create(txn("Groceries", "Food", 5_000))
            .await
            .unwrap();
        let key = MonthRef::new(user, jan());
        assert!(backend.month(&key).unwrap().transaction(created.id).is_some());
    }

    #[tokio::test]
    async fn test_stale_fetch_discarded() {
        let gate = Arc::new(Notify::new());
        let h = harness(MockBackend {
            gate: Some(gate.clone()),
            ..Default::default()
        });
        let january = MonthRef::new(h.user, jan());
        let february = MonthRef::new(h.user, MonthKey::new(2025, 2).unwrap());
        h.coordinator.cache().select(january).unwrap();

        let (fetched, _) = tokio::join!(h.coordinator.fetch_month(&january), async {
            h.coordinator.cache().select(february).unwrap();
            gate.notify_one();
        });

        assert!(fetched.unwrap().is_none());
        assert!(h.coordinator.cache().month(&january).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_moves_between_months() {
        let (h, paycheck) = loaded().await;
        let mut moved = paycheck.clone();
        moved.date = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        moved.actual_amount = Money::from_cents(310_000);

        let updated = h.coordinator.submit_update(moved).await.unwrap();
        assert_eq!(updated.id, paycheck.id);

        let january = MonthRef::new(h.user, jan());
        let february = MonthRef::new(h.user, MonthKey::new(2025, 2).unwrap());
        let cached_jan = h.coordinator.cache().month(&january).unwrap().unwrap();
        assert!(cached_jan.transaction(paycheck.id).is_none());
        let cached_feb = h.coordinator.cache().month(&february).unwrap().unwrap();
        assert_eq!(cached_feb.transactions[0].id, paycheck.id);
        assert_eq!(Some(cached_feb), h.backend.month(&february));

        // the month the record moved into is not on screen but is refetched too
        let cache = h.coordinator.cache();
        for key in cache.cached_months(h.user).unwrap() {
            let month = cache.month(&key).unwrap().unwrap();
            assert!(month.transactions.iter().all(|t| !t.provisional), "{}", key);
        }
        assert!(!cache.is_stale(CacheScope::Budgets).unwrap());
        assert!(!cache.is_stale(CacheScope::Wallets).unwrap());

        let events = h.audit.events();
        assert_eq!(events[0].change_type, ChangeType::Update);
        assert_eq!(events[0].amount_delta, Some(Money::from_cents(10_000)));
        match &events[0].detail {
            Some(AuditDetail::Transaction { changes, .. }) => {
                let fields: Vec<&str> = changes.iter().map(|c| c.field.as_str()).collect();
                assert!(fields.contains(&"date"));
                assert!(fields.contains(&"actualAmount"));
            }
            other => panic!("unexpected detail {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_inactive_month_is_dropped() {
        let (h, paycheck) = loaded().await;
        let february = MonthRef::new(h.user, MonthKey::new(2025, 2).unwrap());
        h.backend.unreachable.lock().unwrap().insert(february);

        let mut moved = paycheck.clone();
        moved.date = NaiveDate::from_ymd_opt(2025, 2, 3).unwrap();
        h.coordinator.submit_update(moved).await.unwrap();

        assert!(h.coordinator.cache().month(&february).unwrap().is_none());
        assert!(h.backend.month(&february).unwrap().transaction(paycheck.id).is_some());
        let january = MonthRef::new(h.user, jan());
        assert!(h.coordinator.cache().month(&january).unwrap().unwrap().transactions.is_empty());
    }

    #[tokio::test]
    async fn test_active_refetch_failure_keeps_cached_data() {
        let (h, _) = loaded().await;
        let january = MonthRef::new(h.user, jan());
        h.backend.unreachable.lock().unwrap().insert(january);

        h.coordinator
            .submit_create(txn("Coffee", "Food", 450))
            .await
            .unwrap();

        let cached = h.coordinator.cache().month(&january).unwrap().unwrap();
        assert_eq!(cached.transactions.len(), 2);
        assert!(h.coordinator.cache().is_stale(CacheScope::Budgets).unwrap());
        let kinds: Vec<NotificationType> = h
            .coordinator
            .notifications()
            .drain()
            .iter()
            .map(|n| n.notification_type)
            .collect();
        assert_eq!(kinds, vec![NotificationType::Success, NotificationType::Info]);
    }

    #[tokio::test]
    async fn test_overlapping_mutation_failure_converges_on_backend() {
        let gate = Arc::new(Notify::new());
        let h = harness(MockBackend {
            hold: Some(("Slow".to_string(), gate.clone())),
            ..Default::default()
        });
        h.coordinator.load(jan()).await.unwrap();
        let key = MonthRef::new(h.user, jan());

        let (slow, fast) = tokio::join!(
            h.coordinator.submit_create(txn("Slow", "Food", 1_000)),
            async {
                tokio::task::yield_now().await;
                let fast = h.coordinator.submit_create(txn("Fast", "Food", 2_000)).await;
                h.backend.fail_writes.store(true, Ordering::SeqCst);
                gate.notify_one();
                fast
            }
        );

        assert!(slow.unwrap_err().is_network());
        let fast = fast.unwrap();

        let cached = h.coordinator.cache().month(&key).unwrap().unwrap();
        assert_eq!(Some(cached.clone()), h.backend.month(&key));
        assert_eq!(cached.transactions.len(), 1);
        assert_eq!(cached.transactions[0].id, fast.id);
        assert!(!cached.transactions[0].provisional);
        assert_eq!(h.coordinator.state(), MutationState::Idle);
        assert_eq!(h.audit.events().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_record_in_place() {
        let (h, paycheck) = loaded().await;
        let key = MonthRef::new(h.user, jan());
        let before = h.coordinator.cache().month(&key).unwrap();
        h.backend.fail_writes.store(true, Ordering::SeqCst);

        assert!(h.coordinator.submit_delete(paycheck.id).await.is_err());
        assert_eq!(h.coordinator.cache().month(&key).unwrap(), before);
    }

    #[tokio::test]
    async fn test_delete_unknown_transaction() {
        let (h, _) = loaded().await;
        let err = h
            .coordinator
            .submit_delete(TransactionId::new())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_rate_limited_before_cache() {
        let (h, _) = loaded().await;
        let coordinator = h
            .coordinator
            .with_rate_limiter(RateLimiter::in_memory(1, chrono::Duration::seconds(60)));

        coordinator
            .submit_create(txn("First", "Food", 100))
            .await
            .unwrap();
        let before = coordinator.cache().snapshot().unwrap();

        let err = coordinator
            .submit_create(txn("Second", "Food", 100))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::RateLimited { .. }));
        assert_eq!(coordinator.cache().snapshot().unwrap(), before);
    }

    #[tokio::test]
    async fn test_limits_follow_category_lifecycle() {
        let (h, _) = loaded().await;
        let key = MonthRef::new(h.user, jan());

        h.coordinator
            .submit_limit(jan(), &"food".into(), Some(Money::from_cents(40_000)))
            .await
            .unwrap();
        assert!(h
            .coordinator
            .submit_limit(jan(), &"Pets".into(), Some(Money::from_cents(100)))
            .await
            .unwrap_err()
            .is_not_found());

        h.coordinator
            .submit_add_category(Category::new("Pets", SemanticType::Expense))
            .await
            .unwrap();
        h.coordinator
            .submit_limit(jan(), &"Pets".into(), Some(Money::from_cents(100)))
            .await
            .unwrap();
        let cached = h.coordinator.cache().month(&key).unwrap().unwrap();
        assert_eq!(cached.limit(&"Pets".into()), Some(Money::from_cents(100)));
        assert_eq!(cached.limit(&"Food".into()), Some(Money::from_cents(40_000)));

        h.coordinator
            .submit_remove_category(&"Pets".into())
            .await
            .unwrap();
        let cached = h.coordinator.cache().month(&key).unwrap().unwrap();
        assert_eq!(cached.limit(&"Pets".into()), None);
        assert!(!h.coordinator.cache().taxonomy().unwrap().contains(&"Pets".into()));

        assert!(h
            .coordinator
            .submit_remove_category(&"Food".into())
            .await
            .unwrap_err()
            .is_validation());
        assert!(matches!(
            h.coordinator
                .submit_add_category(Category::new("Food", SemanticType::Expense))
                .await
                .unwrap_err(),
            LedgerError::Duplicate { .. }
        ));
        assert!(h
            .coordinator
            .submit_limit(jan(), &"Food".into(), Some(Money::from_cents(-5)))
            .await
            .unwrap_err()
            .is_validation());

        let kinds: Vec<EntityType> = h.audit.events().iter().map(|e| e.entity_type).collect();
        assert_eq!(
            kinds,
            vec![
                EntityType::BudgetLimit,
                EntityType::Category,
                EntityType::BudgetLimit,
                EntityType::Category
            ]
        );
    }

    #[tokio::test]
    async fn test_transfer_into_savings_wallet_balance() {
        let vault = Wallet::new("Vault", WalletType::Savings).savings(true);
        let checking = Wallet::new("Checking", WalletType::Checking);
        let h = harness(MockBackend {
            wallets: vec![checking.clone(), vault.clone()],
            ..Default::default()
        });
        h.coordinator.load(jan()).await.unwrap();

        let mut transfer = txn("To vault", "Other", 5_000).transfer_to(vault.id);
        transfer.source_wallet_id = checking.id;
        h.coordinator.submit_create(transfer).await.unwrap();

        let event = &h.audit.events()[0];
        assert_eq!(event.previous_balance, Some(Money::zero()));
        assert_eq!(event.new_balance, Some(Money::from_cents(-5_000)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidation_delay_before_refetch() {
        let (h, _) = loaded().await;
        let coordinator = h
            .coordinator
            .with_invalidation_delay(Duration::from_millis(750));

        let started = tokio::time::Instant::now();
        coordinator
            .submit_create(txn("Coffee", "Food", 450))
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(750));
        assert!(!coordinator
            .cache()
            .is_stale(CacheScope::Budgets)
            .unwrap());
        assert!(coordinator
            .cache()
            .is_stale(CacheScope::Stats)
            .unwrap());
    }
}
