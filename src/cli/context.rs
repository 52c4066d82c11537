//! Wiring shared by every command
//!
//! Opens the JSON store, builds the cache and the mutation coordinator from
//! the user's settings, and parses the argument formats the commands share.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::audit::{AuditSink, JsonlAuditSink, NullAuditSink};
use crate::config::{MonthwisePaths, Settings};
use crate::display::DisplayStyle;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Money, MonthKey, Taxonomy, TransactionId, Wallet};
use crate::services::{LedgerCache, MutationCoordinator, NotificationType, RateLimiter};
use crate::storage::Storage;

/// Everything a command handler needs
pub struct LedgerContext {
    pub paths: MonthwisePaths,
    pub settings: Settings,
    pub style: DisplayStyle,
    pub storage: Arc<Storage>,
    pub coordinator: MutationCoordinator<Storage>,
}

impl LedgerContext {
    /// Open the store under `paths` and load it
    pub fn open(paths: MonthwisePaths, settings: Settings) -> LedgerResult<Self> {
        let storage = Arc::new(Storage::new(paths.clone())?);
        storage.load_all()?;

        let audit: Arc<dyn AuditSink> = if settings.audit_enabled {
            Arc::new(JsonlAuditSink::new(paths.audit_log()))
        } else {
            Arc::new(NullAuditSink)
        };

        let mut coordinator = MutationCoordinator::new(
            settings.user_id,
            Arc::clone(&storage),
            Arc::new(LedgerCache::new()),
            audit,
        )
        .with_invalidation_delay(settings.invalidation_delay());

        if let Some(limit) = settings.rate_limit {
            coordinator = coordinator.with_rate_limiter(RateLimiter::in_memory(
                limit.max_mutations,
                chrono::Duration::seconds(limit.window_secs),
            ));
        }

        Ok(Self {
            paths,
            style: DisplayStyle::from_settings(&settings),
            settings,
            storage,
            coordinator,
        })
    }

    /// Taxonomy as the coordinator currently sees it
    pub fn taxonomy(&self) -> LedgerResult<Taxonomy> {
        self.coordinator.cache().taxonomy()
    }

    pub fn wallets(&self) -> LedgerResult<Vec<Wallet>> {
        self.coordinator.cache().wallets()
    }

    /// Resolve a full or shortened transaction id
    pub fn resolve_transaction(&self, needle: &str) -> LedgerResult<TransactionId> {
        self.storage
            .months
            .resolve_transaction_id(self.settings.user_id, needle)
    }

    /// Print queued notifications; errors and warnings go to stderr
    pub fn flush_notifications(&self) {
        for notification in self.coordinator.notifications().drain() {
            match notification.notification_type {
                NotificationType::Error | NotificationType::Warning => {
                    eprintln!("{}", notification)
                }
                NotificationType::Info | NotificationType::Success => println!("{}", notification),
            }
        }
    }
}

/// Parse an optional month argument, defaulting to the current month
pub fn parse_month(month: Option<&str>) -> LedgerResult<MonthKey> {
    match month {
        Some(s) => MonthKey::parse(s).map_err(|e| {
            LedgerError::Validation(format!(
                "Invalid month: '{}'. Use YYYY-MM, 'current' or 'last' ({})",
                s, e
            ))
        }),
        None => Ok(MonthKey::current()),
    }
}

/// Parse a money argument
pub fn parse_amount(amount: &str) -> LedgerResult<Money> {
    Money::parse(amount).map_err(|e| {
        LedgerError::Validation(format!(
            "Invalid amount format: '{}'. Use format like '50.00' or '100'. Error: {}",
            amount, e
        ))
    })
}

/// Parse a date argument, defaulting to today
pub fn parse_date(date: Option<&str>) -> LedgerResult<NaiveDate> {
    match date {
        Some(date_str) => NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|_| {
            LedgerError::Validation(format!(
                "Invalid date format: '{}'. Use YYYY-MM-DD",
                date_str
            ))
        }),
        None => Ok(chrono::Local::now().date_naive()),
    }
}
