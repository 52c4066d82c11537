//! Core data models for Monthwise
//!
//! This module contains the plain records the ledger engine consumes and
//! produces: transactions, wallets, categories, budget months, and the
//! money/month/id value types they are built from.

pub mod budget_month;
pub mod category;
pub mod ids;
pub mod money;
pub mod month;
pub mod transaction;
pub mod wallet;

pub use budget_month::{BudgetMonth, BudgetValidationError};
pub use category::{Category, CategoryId, CategoryValidationError, SemanticType, Taxonomy};
pub use ids::{BudgetMonthId, GoalId, TransactionId, UserId, WalletId};
pub use money::Money;
pub use month::{MonthKey, MonthParseError, MonthRef};
pub use transaction::{Transaction, TransactionKind, TransactionValidationError};
pub use wallet::{find_wallet, resolve_wallet, Wallet, WalletType};
