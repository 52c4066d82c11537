//! Mutation rate limiting
//!
//! Counters live behind the `CounterStore` trait so the window bookkeeping can
//! sit in memory for the CLI or in a shared store elsewhere.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};

use crate::error::{LedgerError, LedgerResult};

/// A counter with its expiry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterEntry {
    pub count: u32,
    pub expires_at: DateTime<Utc>,
}

/// Key to counter storage
pub trait CounterStore: Send + Sync {
    fn get(&self, key: &str) -> LedgerResult<Option<CounterEntry>>;
    fn put(&self, key: &str, entry: CounterEntry) -> LedgerResult<()>;
    fn remove(&self, key: &str) -> LedgerResult<()>;
    /// Drop every entry expired at `now`, returning how many went
    fn purge_expired(&self, now: DateTime<Utc>) -> LedgerResult<usize>;
}

/// Process-local counter store
#[derive(Debug, Default)]
pub struct InMemoryCounterStore {
    counters: RwLock<HashMap<String, CounterEntry>>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.counters.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CounterStore for InMemoryCounterStore {
    fn get(&self, key: &str) -> LedgerResult<Option<CounterEntry>> {
        let counters = self
            .counters
            .read()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire read lock: {}", e)))?;
        Ok(counters.get(key).copied())
    }

    fn put(&self, key: &str, entry: CounterEntry) -> LedgerResult<()> {
        let mut counters = self
            .counters
            .write()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire write lock: {}", e)))?;
        counters.insert(key.to_string(), entry);
        Ok(())
    }

    fn remove(&self, key: &str) -> LedgerResult<()> {
        let mut counters = self
            .counters
            .write()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire write lock: {}", e)))?;
        counters.remove(key);
        Ok(())
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> LedgerResult<usize> {
        let mut counters = self
            .counters
            .write()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire write lock: {}", e)))?;
        let before = counters.len();
        counters.retain(|_, entry| entry.expires_at > now);
        Ok(before - counters.len())
    }
}

/// Fixed-window limiter: at most `max` hits per key per window
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    max: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, max: u32, window: Duration) -> Self {
        Self { store, max, window }
    }

    /// Record a hit for `key`, failing once the window is exhausted
    ///
    /// Expired counters of every key are purged on the way.
    pub fn check(&self, key: &str, now: DateTime<Utc>) -> LedgerResult<()> {
        self.store.purge_expired(now)?;
        let entry = match self.store.get(key)? {
            Some(entry) if entry.expires_at > now => entry,
            _ => CounterEntry {
                count: 0,
                expires_at: now + self.window,
            },
        };

        if entry.count >= self.max {
            return Err(LedgerError::RateLimited {
                key: key.to_string(),
                retry_after_secs: (entry.expires_at - now).num_seconds().max(1),
            });
        }

        self.store.put(
            key,
            CounterEntry {
                count: entry.count + 1,
                ..entry
            },
        )
    }

    /// Limiter backed by a fresh in-memory store
    pub fn in_memory(max: u32, window: Duration) -> Self {
        Self::new(Arc::new(InMemoryCounterStore::new()), max, window)
    }

    /// Forget the counter for `key`
    pub fn reset(&self, key: &str) -> LedgerResult<()> {
        self.store.remove(key)
    }
}
