//! Monthwise - monthly personal-finance ledger
//!
//! This library groups transactions into per-month budgets, classifies each
//! one as income, expense, savings or transfer, and derives totals, daily
//! series, month-over-month trends and per-category limit status. Changes are
//! applied optimistically to a local cache and rolled back when the store
//! rejects them.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Core data models (transactions, wallets, categories, months)
//! - `services`: Classification, aggregation, trends, limits, cache and the
//!   mutation coordinator
//! - `storage`: JSON file storage layer and the backend trait
//! - `audit`: Audit events and sinks
//! - `cli`: Command handlers
//! - `display`: Terminal formatting
//!
//! # Example
//!
//! ```rust,ignore
//! use monthwise::models::{MonthKey, Taxonomy};
//! use monthwise::services::{Aggregator, ClassificationRules};
//!
//! let taxonomy = Taxonomy::new();
//! let aggregator = Aggregator::new(ClassificationRules::new(&taxonomy));
//! let summary = aggregator.aggregate(MonthKey::current(), &transactions, &wallets);
//! println!("balance: {}", summary.balance);
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{LedgerError, LedgerResult};
