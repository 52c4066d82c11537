//! Service layer for Monthwise
//!
//! Pure ledger logic (classification, aggregation, trends, limits) plus the
//! client-side cache and the optimistic mutation coordinator that keeps it in
//! step with the authoritative store.

pub mod aggregate;
pub mod cache;
pub mod classify;
pub mod limits;
pub mod mutation;
pub mod notifications;
pub mod rate_limit;
pub mod trend;

pub use aggregate::{Aggregator, DailyPoint, DailySeries, MonthSummary, Totals};
pub use cache::{CacheScope, CacheSnapshot, LedgerCache};
pub use classify::{ClassificationRules, TxClass, INCOME_CATEGORIES, SAVINGS_CATEGORIES};
pub use limits::{forget_category, LimitCard, LimitStatus, LimitTracker, OverallProgress};
pub use mutation::{MutationCoordinator, MutationState};
pub use notifications::{Notification, NotificationQueue, NotificationType};
pub use rate_limit::{CounterEntry, CounterStore, InMemoryCounterStore, RateLimiter};
pub use trend::{resolve_previous, round_half_up, trend_percent, MonthComparison, TrendEngine, Trends};
