//! Custom category repository
//!
//! Built-in categories are compiled in; only each user's custom additions are
//! persisted, in `categories.json`.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{Category, CategoryValidationError, Taxonomy, UserId};

use super::file_io::{read_json, write_json_atomic};

/// Serializable category data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct CategoryData {
    #[serde(default)]
    pub custom: BTreeMap<UserId, Vec<Category>>,
}

/// Repository for custom category persistence
pub struct CategoryRepository {
    path: PathBuf,
    custom: RwLock<BTreeMap<UserId, Vec<Category>>>,
}

impl CategoryRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            custom: RwLock::new(BTreeMap::new()),
        }
    }

    /// Load categories from disk
    pub fn load(&self) -> LedgerResult<()> {
        let file_data: CategoryData = read_json(&self.path)?;

        let mut custom = self
            .custom
            .write()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire write lock: {}", e)))?;
        *custom = file_data.custom;

        Ok(())
    }

    /// A user's custom categories in insertion order
    pub fn custom_for(&self, user: UserId) -> LedgerResult<Vec<Category>> {
        let custom = self
            .custom
            .read()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire read lock: {}", e)))?;
        Ok(custom.get(&user).cloned().unwrap_or_default())
    }

    /// The user's full taxonomy
    pub fn taxonomy(&self, user: UserId) -> LedgerResult<Taxonomy> {
        Ok(Taxonomy::with_custom(self.custom_for(user)?))
    }

    /// Apply `f` to the user's taxonomy and persist the resulting custom list
    ///
    /// Nothing changes, on disk or in memory, when `f` fails; memory is only
    /// updated after the file is written.
    pub fn modify<T>(
        &self,
        user: UserId,
        f: impl FnOnce(&mut Taxonomy) -> Result<T, CategoryValidationError>,
    ) -> LedgerResult<Result<T, CategoryValidationError>> {
        let mut custom = self
            .custom
            .write()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        let current = custom.get(&user).cloned().unwrap_or_default();
        let mut taxonomy = Taxonomy::with_custom(current);
        let value = match f(&mut taxonomy) {
            Ok(value) => value,
            Err(e) => return Ok(Err(e)),
        };

        let mut staged = custom.clone();
        staged.insert(user, taxonomy.custom().to_vec());
        write_json_atomic(&self.path, &CategoryData { custom: staged.clone() })?;

        *custom = staged;
        Ok(Ok(value))
    }
}
