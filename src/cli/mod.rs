//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the mutation coordinator and the
//! read-only ledger services.

pub mod audit;
pub mod category;
pub mod context;
pub mod limit;
pub mod report;
pub mod transaction;
pub mod wallet;

pub use audit::handle_audit_command;
pub use category::{handle_category_command, CategoryCommands};
pub use context::LedgerContext;
pub use limit::{handle_limit_command, LimitCommands};
pub use report::{handle_daily_command, handle_limits_command, handle_summary_command};
pub use transaction::{handle_transaction_command, TransactionCommands};
pub use wallet::{handle_wallet_command, WalletCommands};
