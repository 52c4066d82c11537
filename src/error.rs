//! Custom error types for Monthwise
//!
//! This module defines the error hierarchy for the ledger engine using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

use crate::models::CategoryValidationError;

/// The main error type for Monthwise operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Missing or malformed required fields, rejected before the cache is touched
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// The remote write or fetch failed
    #[error("Network failure: {0}")]
    Network(String),

    /// Cached state references something that no longer exists
    #[error("Cache inconsistency: {0}")]
    CacheInconsistency(String),

    /// Too many mutations for one key inside the current window
    #[error("Rate limited: {key} (retry in {retry_after_secs}s)")]
    RateLimited { key: String, retry_after_secs: i64 },

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Create a "not found" error for budget months
    pub fn month_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Budget month",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for categories
    pub fn category_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Category",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for transactions
    pub fn transaction_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Transaction",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for wallets
    pub fn wallet_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Wallet",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a network failure
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<CategoryValidationError> for LedgerError {
    fn from(err: CategoryValidationError) -> Self {
        match err {
            CategoryValidationError::Duplicate(name) => Self::Duplicate {
                entity_type: "Category",
                identifier: name,
            },
            CategoryValidationError::Unknown(name) => Self::category_not_found(name),
            other => Self::Validation(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for Monthwise operations
pub type LedgerResult<T> = Result<T, LedgerError>;
