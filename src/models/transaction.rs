//! Transaction model
//!
//! A dated financial event moving money out of (or into) a wallet. The
//! explicit type is optional; classification falls back to the category's
//! semantic type when it is missing.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::category::CategoryId;
use super::ids::{GoalId, TransactionId, WalletId};
use super::money::Money;
use super::month::MonthKey;

/// Explicit transaction type as entered by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
    Transfer,
    Savings,
}

impl TransactionKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" => Some(Self::Income),
            "expense" | "expenses" => Some(Self::Expense),
            "transfer" => Some(Self::Transfer),
            "savings" | "saving" => Some(Self::Savings),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Income => write!(f, "income"),
            Self::Expense => write!(f, "expense"),
            Self::Transfer => write!(f, "transfer"),
            Self::Savings => write!(f, "savings"),
        }
    }
}

/// A ledger transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,

    pub name: String,

    #[serde(default)]
    pub planned_amount: Money,

    #[serde(default)]
    pub actual_amount: Money,

    pub category: CategoryId,

    /// Explicit type, absent on older records
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionKind>,

    /// Calendar date; decides the owning budget month
    pub date: NaiveDate,

    /// When the server recorded the transaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    pub source_wallet_id: WalletId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_wallet_id: Option<WalletId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_goal_id: Option<GoalId>,

    /// Local-only record awaiting server confirmation
    #[serde(skip)]
    pub provisional: bool,
}

impl Transaction {
    /// Create a new transaction with a fresh id
    pub fn new(
        name: impl Into<String>,
        category: impl Into<CategoryId>,
        actual_amount: Money,
        date: NaiveDate,
        source_wallet_id: WalletId,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            name: name.into(),
            planned_amount: Money::zero(),
            actual_amount,
            category: category.into(),
            kind: None,
            date,
            timestamp: None,
            source_wallet_id,
            destination_wallet_id: None,
            linked_goal_id: None,
            provisional: false,
        }
    }

    /// Builder-style explicit type
    pub fn with_kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Builder-style planned amount
    pub fn with_planned(mut self, planned_amount: Money) -> Self {
        self.planned_amount = planned_amount;
        self
    }

    /// Turn this into a transfer to another wallet
    pub fn transfer_to(mut self, destination: WalletId) -> Self {
        self.kind = Some(TransactionKind::Transfer);
        self.destination_wallet_id = Some(destination);
        self
    }

    /// The budget month this transaction belongs to
    pub fn month(&self) -> MonthKey {
        MonthKey::of(self.date)
    }

    /// Check if this is a transfer, either by type or by category
    pub fn is_transfer(&self) -> bool {
        self.kind == Some(TransactionKind::Transfer) || self.category.matches("Transfer")
    }

    /// A local copy with a temporary id, shown until the server copy arrives
    pub fn provisional_copy(&self) -> Self {
        let mut copy = self.clone();
        copy.id = TransactionId::new();
        copy.timestamp = None;
        copy.provisional = true;
        copy
    }

    /// Validate required fields
    pub fn validate(&self) -> Result<(), TransactionValidationError> {
        if self.name.trim().is_empty() {
            return Err(TransactionValidationError::EmptyName);
        }

        if self.category.is_empty() {
            return Err(TransactionValidationError::MissingCategory);
        }

        if self.actual_amount.is_negative() || self.planned_amount.is_negative() {
            return Err(TransactionValidationError::NegativeAmount);
        }

        if self.kind == Some(TransactionKind::Transfer) {
            match self.destination_wallet_id {
                None => return Err(TransactionValidationError::MissingDestination),
                Some(dest) if dest == self.source_wallet_id => {
                    return Err(TransactionValidationError::SameWallet)
                }
                Some(_) => {}
            }
        }

        Ok(())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}] {}",
            self.date.format("%Y-%m-%d"),
            self.name,
            self.category,
            self.actual_amount
        )
    }
}

/// Validation errors for transactions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionValidationError {
    EmptyName,
    MissingCategory,
    NegativeAmount,
    MissingDestination,
    SameWallet,
}

impl fmt::Display for TransactionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Transaction name cannot be empty"),
            Self::MissingCategory => write!(f, "Transaction category is required"),
            Self::NegativeAmount => write!(f, "Transaction amounts cannot be negative"),
            Self::MissingDestination => {
                write!(f, "Transfer transactions need a destination wallet")
            }
            Self::SameWallet => write!(f, "Transfer source and destination must differ"),
        }
    }
}

impl std::error::Error for TransactionValidationError {}
