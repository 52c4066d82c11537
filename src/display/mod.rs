//! Display formatting for terminal output
//!
//! Turns summaries, limit cards and records into plain-text tables.

pub mod category;
pub mod limits;
pub mod report;
pub mod style;
pub mod summary;
pub mod transaction;
pub mod wallet;

pub use category::format_category_list;
pub use limits::format_limit_cards;
pub use style::DisplayStyle;
pub use summary::{format_daily_series, format_month_summary};
pub use transaction::{format_transaction_details, format_transaction_register};
pub use wallet::format_wallet_list;
