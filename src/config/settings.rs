//! User settings for Monthwise
//!
//! Persisted as `config.json` in the base directory. Every field has a
//! default so older files keep loading as fields are added.

use serde::{Deserialize, Serialize};

use super::paths::MonthwisePaths;
use crate::error::LedgerError;
use crate::models::UserId;

/// Mutation rate limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitSettings {
    /// Maximum mutations per window
    pub max_mutations: u32,
    /// Window length in seconds
    pub window_secs: i64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_mutations: 60,
            window_secs: 60,
        }
    }
}

/// User settings for Monthwise
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// The ledger owner; assigned once at `init`
    #[serde(default)]
    pub user_id: UserId,

    /// Default currency symbol
    #[serde(default = "default_currency")]
    pub currency_symbol: String,

    /// Date format preference (strftime format)
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Pause between a settled mutation and cache invalidation
    #[serde(default = "default_invalidation_delay_ms")]
    pub invalidation_delay_ms: u64,

    /// Per-user mutation rate limit; `None` disables limiting
    #[serde(default)]
    pub rate_limit: Option<RateLimitSettings>,

    /// Whether mutations are written to the audit log
    #[serde(default = "default_audit_enabled")]
    pub audit_enabled: bool,
}

fn default_schema_version() -> u32 {
    1
}

fn default_currency() -> String {
    "$".to_string()
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

fn default_invalidation_delay_ms() -> u64 {
    0
}

fn default_audit_enabled() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            user_id: UserId::new(),
            currency_symbol: default_currency(),
            date_format: default_date_format(),
            invalidation_delay_ms: default_invalidation_delay_ms(),
            rate_limit: None,
            audit_enabled: default_audit_enabled(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &MonthwisePaths) -> Result<Self, LedgerError> {
        let settings_path = paths.settings_file();

        if !settings_path.exists() {
            // Not saved until the caller decides to persist
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| LedgerError::Io(format!("Failed to read settings file: {}", e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| LedgerError::Config(format!("Failed to parse settings file: {}", e)))
    }

    /// Save settings to disk
    pub fn save(&self, paths: &MonthwisePaths) -> Result<(), LedgerError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| LedgerError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| LedgerError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }

    pub fn invalidation_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.invalidation_delay_ms)
    }
}
