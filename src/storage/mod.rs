//! Storage layer for Monthwise
//!
//! Provides JSON file storage with atomic writes and automatic directory
//! creation. `Storage` is the authoritative store behind the CLI and plays the
//! server role for the mutation coordinator.

pub mod backend;
pub mod categories;
pub mod file_io;
pub mod init;
pub mod months;
pub mod wallets;

pub use backend::LedgerBackend;
pub use categories::CategoryRepository;
pub use file_io::{read_json, write_json_atomic};
pub use init::initialize_storage;
pub use months::MonthRepository;
pub use wallets::WalletRepository;

use async_trait::async_trait;
use chrono::Utc;

use crate::config::paths::MonthwisePaths;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    BudgetMonth, Category, CategoryId, Money, MonthRef, Transaction, TransactionId, UserId, Wallet,
};

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: MonthwisePaths,
    pub months: MonthRepository,
    pub wallets: WalletRepository,
    pub categories: CategoryRepository,
}

impl Storage {
    /// Create a new Storage instance
    pub fn new(paths: MonthwisePaths) -> Result<Self, LedgerError> {
        paths.ensure_directories()?;

        Ok(Self {
            months: MonthRepository::new(paths.months_file()),
            wallets: WalletRepository::new(paths.wallets_file()),
            categories: CategoryRepository::new(paths.categories_file()),
            paths,
        })
    }

    /// Get the paths configuration
    pub fn paths(&self) -> &MonthwisePaths {
        &self.paths
    }

    /// Load all data from disk
    pub fn load_all(&self) -> Result<(), LedgerError> {
        self.months.load()?;
        self.wallets.load()?;
        self.categories.load()?;
        Ok(())
    }

    /// Check if storage has been initialized
    pub fn is_initialized(&self) -> bool {
        self.paths.is_initialized()
    }
}

#[async_trait]
impl LedgerBackend for Storage {
    async fn fetch_month(&self, key: &MonthRef) -> LedgerResult<BudgetMonth> {
        if let Some(month) = self.months.get(key)? {
            return Ok(month);
        }
        let month = self.months.write(|t| Ok(t.month_mut(key).clone()))?;
        tracing::debug!(month = %key, "created budget month on first access");
        Ok(month)
    }

    async fn list_wallets(&self, _user: UserId) -> LedgerResult<Vec<Wallet>> {
        self.wallets.get_all()
    }

    async fn list_custom_categories(&self, user: UserId) -> LedgerResult<Vec<Category>> {
        self.categories.custom_for(user)
    }

    async fn create_transaction(&self, key: &MonthRef, txn: &Transaction) -> LedgerResult<Transaction> {
        txn.validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;
        if txn.month() != key.key {
            return Err(LedgerError::Validation(format!(
                "Transaction dated {} does not belong to {}",
                txn.date, key.key
            )));
        }

        let canonical = Transaction {
            id: TransactionId::new(),
            timestamp: Some(Utc::now()),
            provisional: false,
            ..txn.clone()
        };

        self.months.write(|t| {
            t.month_mut(key).insert_front(canonical.clone());
            Ok(())
        })?;
        Ok(canonical)
    }

    async fn update_transaction(&self, user: UserId, txn: &Transaction) -> LedgerResult<Transaction> {
        txn.validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;

        self.months.write(|t| {
            let (old_key, old) = t
                .find_transaction(user, txn.id)
                .ok_or_else(|| LedgerError::transaction_not_found(txn.id.to_string()))?;

            let canonical = Transaction {
                timestamp: old.timestamp.or_else(|| Some(Utc::now())),
                provisional: false,
                ..txn.clone()
            };

            let new_key = MonthRef::new(user, canonical.month());
            if new_key == old_key {
                t.month_mut(&old_key).replace_transaction(canonical.clone());
            } else {
                t.month_mut(&old_key).remove_transaction(canonical.id);
                t.month_mut(&new_key).insert_front(canonical.clone());
            }
            Ok(canonical)
        })
    }

    async fn delete_transaction(&self, user: UserId, id: TransactionId) -> LedgerResult<Transaction> {
        self.months.write(|t| {
            let (key, _) = t
                .find_transaction(user, id)
                .ok_or_else(|| LedgerError::transaction_not_found(id.to_string()))?;
            t.month_mut(&key)
                .remove_transaction(id)
                .ok_or_else(|| LedgerError::transaction_not_found(id.to_string()))
        })
    }

    async fn find_transaction(
        &self,
        user: UserId,
        id: TransactionId,
    ) -> LedgerResult<(MonthRef, Transaction)> {
        self.months
            .find_transaction(user, id)?
            .ok_or_else(|| LedgerError::transaction_not_found(id.to_string()))
    }

    async fn set_category_limit(
        &self,
        key: &MonthRef,
        category: &CategoryId,
        limit: Option<Money>,
    ) -> LedgerResult<BudgetMonth> {
        if limit.is_some() && !self.categories.taxonomy(key.user_id)?.contains(category) {
            return Err(LedgerError::category_not_found(category.to_string()));
        }

        self.months.write(|t| {
            let month = t.month_mut(key);
            match limit {
                Some(limit) => {
                    month
                        .set_limit(category.clone(), limit)
                        .map_err(|e| LedgerError::Validation(e.to_string()))?;
                }
                None => {
                    month.clear_limit(category);
                }
            }
            Ok(month.clone())
        })
    }

    async fn add_custom_category(&self, user: UserId, category: &Category) -> LedgerResult<Category> {
        self.categories
            .modify(user, |t| t.add_custom(category.clone()))??;
        Ok(category.clone())
    }

    /// Removes the category, then its limit entries
    ///
    /// The two live in separate files. If the second write fails the leftover
    /// limit entries name an unknown category, which readers already skip.
    async fn remove_custom_category(&self, user: UserId, id: &CategoryId) -> LedgerResult<Category> {
        let removed = self.categories.modify(user, |t| t.remove_custom(id))??;

        let cleared = self.months.write(|t| {
            Ok(t
                .for_user_mut(user)
                .filter_map(|m| m.clear_limit(&removed.id))
                .count())
        })?;
        tracing::debug!(category = %removed.id, months = cleared, "cleared limits of removed category");

        Ok(removed)
    }
}
