//! Classification rules
//!
//! The single place that decides whether a transaction is income, expense,
//! savings or a plain transfer. Every consumer (summaries, category
//! breakdowns, limits) goes through `ClassificationRules` so the policy
//! cannot drift between call sites.

use std::fmt;

use crate::models::{find_wallet, SemanticType, Taxonomy, Transaction, TransactionKind, Wallet};

/// Categories that always count as income
pub const INCOME_CATEGORIES: &[&str] = &[
    "Paycheck",
    "Bonus",
    "Debt Added",
    "Side Hustle",
    "Freelance",
    "Gifts Received",
    "Refund",
    "Loan Repaid",
    "income",
];

/// Categories that always count as savings
pub const SAVINGS_CATEGORIES: &[&str] = &["Investments"];

/// Semantic bucket a transaction lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxClass {
    Income,
    Expense,
    Savings,
    Transfer,
}

impl fmt::Display for TxClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Income => write!(f, "Income"),
            Self::Expense => write!(f, "Expense"),
            Self::Savings => write!(f, "Savings"),
            Self::Transfer => write!(f, "Transfer"),
        }
    }
}

/// Classification policy bound to the current category taxonomy
#[derive(Debug, Clone, Copy)]
pub struct ClassificationRules<'a> {
    taxonomy: &'a Taxonomy,
}

impl<'a> ClassificationRules<'a> {
    pub fn new(taxonomy: &'a Taxonomy) -> Self {
        Self { taxonomy }
    }

    pub fn taxonomy(&self) -> &'a Taxonomy {
        self.taxonomy
    }

    /// Classify a transaction against the wallets as they are right now
    ///
    /// First match wins:
    /// 1. transfers (by type or by the "Transfer" category) into a savings
    ///    wallet are Savings, any other transfer is Transfer
    /// 2. the "Savings" category is Savings whatever the explicit type says
    /// 3. income type or an income category is Income
    /// 4. savings type or a savings category is Savings
    /// 5. expense type is Expense; with no type the taxonomy decides, and
    ///    unknown categories are Expense
    pub fn classify(&self, txn: &Transaction, wallets: &[Wallet]) -> TxClass {
        if txn.is_transfer() {
            return if self.is_savings_destination(txn, wallets) {
                TxClass::Savings
            } else {
                TxClass::Transfer
            };
        }

        if txn.category.matches("Savings") {
            return TxClass::Savings;
        }

        if txn.kind == Some(TransactionKind::Income) || is_income_category(txn) {
            return TxClass::Income;
        }

        if txn.kind == Some(TransactionKind::Savings) || is_savings_category(txn) {
            return TxClass::Savings;
        }

        match txn.kind {
            Some(_) => TxClass::Expense,
            None => match self.taxonomy.semantic_type(&txn.category) {
                Some(SemanticType::Income) => TxClass::Income,
                Some(SemanticType::Savings) => TxClass::Savings,
                Some(SemanticType::Expense) | None => TxClass::Expense,
            },
        }
    }

    /// Whether the transfer's destination wallet is currently a savings wallet
    fn is_savings_destination(&self, txn: &Transaction, wallets: &[Wallet]) -> bool {
        txn.destination_wallet_id
            .and_then(|id| find_wallet(wallets, id))
            .map(|w| w.is_savings_wallet)
            .unwrap_or(false)
    }
}

fn is_income_category(txn: &Transaction) -> bool {
    INCOME_CATEGORIES.iter().any(|c| txn.category.matches(c))
}

fn is_savings_category(txn: &Transaction) -> bool {
    SAVINGS_CATEGORIES.iter().any(|c| txn.category.matches(c))
}
