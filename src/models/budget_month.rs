//! Budget month model
//!
//! One container per (month, year, user) holding the month's transactions in
//! insertion order, the opaque rollover figures, and per-category limits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::category::CategoryId;
use super::ids::{BudgetMonthId, TransactionId, UserId};
use super::money::Money;
use super::month::{MonthKey, MonthRef};
use super::transaction::Transaction;

/// A user's budget for one calendar month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetMonth {
    pub id: BudgetMonthId,

    pub user_id: UserId,

    pub month: u32,

    pub year: i32,

    /// Carried-in planned balance, set externally
    #[serde(default)]
    pub rollover_planned_amount: Money,

    /// Carried-in actual balance, set externally
    #[serde(default)]
    pub rollover_actual_amount: Money,

    /// Newest first for locally inserted records; otherwise server order
    #[serde(default)]
    pub transactions: Vec<Transaction>,

    /// Category limit in cents; zero means unlimited
    #[serde(default)]
    pub category_limits: BTreeMap<CategoryId, Money>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl BudgetMonth {
    /// Create an empty month
    pub fn new(user_id: UserId, key: MonthKey) -> Self {
        let now = Utc::now();
        Self {
            id: BudgetMonthId::new(),
            user_id,
            month: key.month,
            year: key.year,
            rollover_planned_amount: Money::zero(),
            rollover_actual_amount: Money::zero(),
            transactions: Vec::new(),
            category_limits: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> MonthKey {
        MonthKey {
            year: self.year,
            month: self.month,
        }
    }

    /// The (month, year, user) identity of this month
    pub fn month_ref(&self) -> MonthRef {
        MonthRef::new(self.user_id, self.key())
    }

    /// Opening balance carried in from the previous month
    pub fn start_balance(&self) -> Money {
        self.rollover_actual_amount
    }

    /// Planned opening balance carried in from the previous month
    pub fn planned_start_balance(&self) -> Money {
        self.rollover_planned_amount
    }

    /// Find a transaction by id
    pub fn transaction(&self, id: TransactionId) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    /// Splice a transaction in at the head of the list
    pub fn insert_front(&mut self, txn: Transaction) {
        self.transactions.insert(0, txn);
        self.updated_at = Utc::now();
    }

    /// Append a transaction at the end of the list
    pub fn push(&mut self, txn: Transaction) {
        self.transactions.push(txn);
        self.updated_at = Utc::now();
    }

    /// Replace a transaction in place, returning the previous version
    pub fn replace_transaction(&mut self, txn: Transaction) -> Option<Transaction> {
        let slot = self.transactions.iter_mut().find(|t| t.id == txn.id)?;
        let previous = std::mem::replace(slot, txn);
        self.updated_at = Utc::now();
        Some(previous)
    }

    /// Remove a transaction, returning it
    pub fn remove_transaction(&mut self, id: TransactionId) -> Option<Transaction> {
        let index = self.transactions.iter().position(|t| t.id == id)?;
        self.updated_at = Utc::now();
        Some(self.transactions.remove(index))
    }

    /// Current limit entry for a category
    pub fn limit(&self, category: &CategoryId) -> Option<Money> {
        self.category_limits.get(category).copied()
    }

    /// Set a category limit, returning the previous entry
    pub fn set_limit(
        &mut self,
        category: CategoryId,
        limit: Money,
    ) -> Result<Option<Money>, BudgetValidationError> {
        if limit.is_negative() {
            return Err(BudgetValidationError::NegativeLimit);
        }
        self.updated_at = Utc::now();
        Ok(self.category_limits.insert(category, limit))
    }

    /// Drop a category's limit entry entirely (not the same as a zero limit)
    pub fn clear_limit(&mut self, category: &CategoryId) -> Option<Money> {
        let removed = self.category_limits.remove(category);
        if removed.is_some() {
            self.updated_at = Utc::now();
        }
        removed
    }
}

impl fmt::Display for BudgetMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} transactions, start balance {})",
            self.key(),
            self.transactions.len(),
            self.rollover_actual_amount
        )
    }
}

/// Validation errors for budget months
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BudgetValidationError {
    NegativeLimit,
}

impl fmt::Display for BudgetValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeLimit => write!(f, "Category limit cannot be negative"),
        }
    }
}

impl std::error::Error for BudgetValidationError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WalletId;
    use chrono::NaiveDate;

    fn month() -> BudgetMonth {
        BudgetMonth::new(UserId::new(), MonthKey::new(2025, 1).unwrap())
    }

    fn txn(name: &str) -> Transaction {
        Transaction::new(
            name,
            "Food",
            Money::from_cents(100),
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            WalletId::new(),
        )
    }

    #[test]
    fn test_insert_front_keeps_order() {
        let mut m = month();
        m.push(txn("first"));
        m.insert_front(txn("newest"));
        assert_eq!(m.transactions[0].name, "newest");
        assert_eq!(m.transactions[1].name, "first");
    }

    #[test]
    fn test_replace_and_remove() {
        let mut m = month();
        let t = txn("lunch");
        let id = t.id;
        m.push(t);

        let mut edited = m.transaction(id).unwrap().clone();
        edited.name = "dinner".into();
        let previous = m.replace_transaction(edited).unwrap();
        assert_eq!(previous.name, "lunch");
        assert_eq!(m.transaction(id).unwrap().name, "dinner");

        assert!(m.remove_transaction(id).is_some());
        assert!(m.remove_transaction(id).is_none());
        assert!(m.replace_transaction(txn("ghost")).is_none());
    }

    #[test]
    fn test_limits() {
        let mut m = month();
        assert_eq!(m.set_limit("Food".into(), Money::from_cents(500)), Ok(None));
        assert_eq!(m.limit(&"food".into()), Some(Money::from_cents(500)));

        assert_eq!(
            m.set_limit("Food".into(), Money::zero()),
            Ok(Some(Money::from_cents(500)))
        );
        assert_eq!(m.limit(&"Food".into()), Some(Money::zero()));

        assert_eq!(m.clear_limit(&"FOOD".into()), Some(Money::zero()));
        assert_eq!(m.limit(&"Food".into()), None);

        assert_eq!(
            m.set_limit("Food".into(), Money::from_cents(-1)),
            Err(BudgetValidationError::NegativeLimit)
        );
    }

    #[test]
    fn test_serialization() {
        let mut m = month();
        m.rollover_actual_amount = Money::from_cents(2500);
        m.push(txn("lunch"));
        m.set_limit("Food".into(), Money::from_cents(500)).unwrap();

        let json = serde_json::to_string(&m).unwrap();
        assert!(json.contains("\"rolloverActualAmount\":2500"));
        let back: BudgetMonth = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
        assert_eq!(back.start_balance(), Money::from_cents(2500));
    }
}
