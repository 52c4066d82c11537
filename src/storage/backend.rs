//! Authoritative ledger store boundary
//!
//! The mutation coordinator only talks to the store through this trait. The
//! JSON file `Storage` implements it for the CLI; tests plug in mocks.

use async_trait::async_trait;

use crate::error::LedgerResult;
use crate::models::{
    BudgetMonth, Category, CategoryId, Money, MonthRef, Transaction, TransactionId, UserId, Wallet,
};

#[async_trait]
pub trait LedgerBackend: Send + Sync {
    /// Fetch a month, creating an empty one on first access
    async fn fetch_month(&self, key: &MonthRef) -> LedgerResult<BudgetMonth>;

    async fn list_wallets(&self, user: UserId) -> LedgerResult<Vec<Wallet>>;

    async fn list_custom_categories(&self, user: UserId) -> LedgerResult<Vec<Category>>;

    /// Store a new transaction in `key`'s month, returning the canonical record
    async fn create_transaction(&self, key: &MonthRef, txn: &Transaction) -> LedgerResult<Transaction>;

    /// Replace a transaction found by its global id, moving it between months
    /// when its date changed
    async fn update_transaction(&self, user: UserId, txn: &Transaction) -> LedgerResult<Transaction>;

    /// Delete a transaction by its global id, returning what was removed
    async fn delete_transaction(&self, user: UserId, id: TransactionId) -> LedgerResult<Transaction>;

    /// Locate a transaction by its global id
    async fn find_transaction(
        &self,
        user: UserId,
        id: TransactionId,
    ) -> LedgerResult<(MonthRef, Transaction)>;

    /// Set (`Some`) or clear (`None`) a category limit, returning the month
    async fn set_category_limit(
        &self,
        key: &MonthRef,
        category: &CategoryId,
        limit: Option<Money>,
    ) -> LedgerResult<BudgetMonth>;

    async fn add_custom_category(&self, user: UserId, category: &Category) -> LedgerResult<Category>;

    /// Remove a custom category and its limit entries in every month
    async fn remove_custom_category(&self, user: UserId, id: &CategoryId) -> LedgerResult<Category>;
}
