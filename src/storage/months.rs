//! Budget month repository
//!
//! All months of all users live in `months.json`, keyed in memory by
//! (user, month, year).

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{BudgetMonth, MonthRef, Transaction, TransactionId, UserId};

use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct MonthData {
    months: Vec<BudgetMonth>,
}

/// Every stored month, keyed by (user, month)
#[derive(Debug, Clone, Default)]
pub struct MonthTable(BTreeMap<MonthRef, BudgetMonth>);

impl MonthTable {
    pub fn get(&self, key: &MonthRef) -> Option<&BudgetMonth> {
        self.0.get(key)
    }

    /// The month at `key`, created empty on first access
    pub fn month_mut(&mut self, key: &MonthRef) -> &mut BudgetMonth {
        self.0
            .entry(*key)
            .or_insert_with(|| BudgetMonth::new(key.user_id, key.key))
    }

    pub fn for_user_mut(&mut self, user: UserId) -> impl Iterator<Item = &mut BudgetMonth> + '_ {
        self.0.values_mut().filter(move |m| m.user_id == user)
    }

    /// Locate a transaction by id across a user's months
    pub fn find_transaction(&self, user: UserId, id: TransactionId) -> Option<(MonthRef, Transaction)> {
        self.0
            .iter()
            .filter(|(key, _)| key.user_id == user)
            .find_map(|(key, m)| m.transaction(id).map(|t| (*key, t.clone())))
    }
}

pub struct MonthRepository {
    path: PathBuf,
    data: RwLock<MonthTable>,
}

impl MonthRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(MonthTable::default()),
        }
    }

    /// Load months from disk
    pub fn load(&self) -> LedgerResult<()> {
        let file_data: MonthData = read_json(&self.path)?;

        let mut data = self
            .data
            .write()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        *data = MonthTable(
            file_data
                .months
                .into_iter()
                .map(|m| (m.month_ref(), m))
                .collect(),
        );

        Ok(())
    }

    /// Apply `f` to a staged copy of the table and persist it
    ///
    /// The in-memory table only changes once the file is written, so a
    /// failed `f` or a failed write leaves both untouched.
    pub fn write<T>(&self, f: impl FnOnce(&mut MonthTable) -> LedgerResult<T>) -> LedgerResult<T> {
        let mut data = self
            .data
            .write()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        let mut staged = data.clone();
        let result = f(&mut staged)?;

        let file_data = MonthData {
            months: staged.0.values().cloned().collect(),
        };
        write_json_atomic(&self.path, &file_data)?;

        *data = staged;
        Ok(result)
    }

    pub fn get(&self, key: &MonthRef) -> LedgerResult<Option<BudgetMonth>> {
        let data = self
            .data
            .read()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.get(key).cloned())
    }

    /// Every month of a user, oldest first
    pub fn for_user(&self, user: UserId) -> LedgerResult<Vec<BudgetMonth>> {
        let data = self
            .data
            .read()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data
            .0
            .values()
            .filter(|m| m.user_id == user)
            .cloned()
            .collect())
    }

    pub fn find_transaction(
        &self,
        user: UserId,
        id: TransactionId,
    ) -> LedgerResult<Option<(MonthRef, Transaction)>> {
        let data = self
            .data
            .read()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.find_transaction(user, id))
    }

    /// Resolve a full or shortened transaction id (`txn-1a2b3c4d` or a uuid prefix)
    pub fn resolve_transaction_id(&self, user: UserId, needle: &str) -> LedgerResult<TransactionId> {
        if let Ok(id) = needle.parse::<TransactionId>() {
            return Ok(id);
        }

        let prefix = needle.trim().trim_start_matches("txn-").to_lowercase();
        let data = self
            .data
            .read()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let matches: Vec<TransactionId> = data
            .0
            .values()
            .filter(|m| m.user_id == user)
            .flat_map(|m| m.transactions.iter())
            .filter(|t| !prefix.is_empty() && t.id.as_uuid().to_string().starts_with(&prefix))
            .map(|t| t.id)
            .collect();

        match matches.as_slice() {
            [id] => Ok(*id),
            [] => Err(LedgerError::transaction_not_found(needle)),
            _ => Err(LedgerError::Validation(format!(
                "Transaction id '{}' is ambiguous",
                needle
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, MonthKey, WalletId};
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, MonthRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = MonthRepository::new(temp_dir.path().join("months.json"));
        (temp_dir, repo)
    }

    fn key(user: UserId, month: u32) -> MonthRef {
        MonthRef::new(user, MonthKey::new(2025, month).unwrap())
    }

    fn rent(user_month: &MonthRef) -> Transaction {
        Transaction::new(
            "Rent",
            "Housing",
            Money::from_cents(120_000),
            user_month.key.start_date(),
            WalletId::new(),
        )
    }

    #[test]
    fn test_write_creates_lazily_and_persists() {
        let (temp, repo) = create_test_repo();
        let user = UserId::new();
        let k = key(user, 1);
        assert!(repo.get(&k).unwrap().is_none());

        let t = rent(&k);
        repo.write(|table| {
            table.month_mut(&k).push(t.clone());
            Ok(())
        })
        .unwrap();
        assert_eq!(repo.get(&k).unwrap().unwrap().key(), k.key);

        let reloaded = MonthRepository::new(temp.path().join("months.json"));
        reloaded.load().unwrap();
        let month = reloaded.get(&k).unwrap().unwrap();
        assert_eq!(month.transactions, vec![t.clone()]);
        assert_eq!(
            reloaded.find_transaction(user, t.id).unwrap().map(|(k, _)| k),
            Some(k)
        );
        assert!(reloaded.find_transaction(UserId::new(), t.id).unwrap().is_none());
    }

    #[test]
    fn test_failed_closure_changes_nothing() {
        let (temp, repo) = create_test_repo();
        let k = key(UserId::new(), 2);

        let result: LedgerResult<()> = repo.write(|table| {
            table.month_mut(&k);
            Err(LedgerError::Validation("no".into()))
        });
        assert!(result.unwrap_err().is_validation());
        assert!(repo.get(&k).unwrap().is_none());
        assert!(!temp.path().join("months.json").exists());
    }

    #[test]
    fn test_failed_save_leaves_memory_untouched() {
        let temp = TempDir::new().unwrap();
        // a directory where the file should go makes the final rename fail
        let path = temp.path().join("months.json");
        std::fs::create_dir_all(path.join("blocker")).unwrap();
        let repo = MonthRepository::new(path);
        let k = key(UserId::new(), 3);

        let result = repo.write(|table| {
            table.month_mut(&k).push(rent(&k));
            Ok(())
        });
        assert!(result.is_err());
        assert!(repo.get(&k).unwrap().is_none());
    }

    #[test]
    fn test_resolve_short_id() {
        let (_temp, repo) = create_test_repo();
        let user = UserId::new();
        let k = key(user, 1);
        let t = rent(&k);
        repo.write(|table| {
            table.month_mut(&k).push(t.clone());
            Ok(())
        })
        .unwrap();

        assert_eq!(repo.resolve_transaction_id(user, &t.id.to_string()).unwrap(), t.id);
        assert_eq!(
            repo.resolve_transaction_id(user, &t.id.as_uuid().to_string()).unwrap(),
            t.id
        );
        assert!(repo
            .resolve_transaction_id(user, "txn-zzzzzzzz")
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_for_user_scoped() {
        let (_temp, repo) = create_test_repo();
        let user = UserId::new();
        repo.write(|table| {
            table.month_mut(&key(user, 1));
            table.month_mut(&key(user, 2));
            table.month_mut(&key(UserId::new(), 1));
            assert_eq!(table.for_user_mut(user).count(), 2);
            Ok(())
        })
        .unwrap();

        assert_eq!(repo.for_user(user).unwrap().len(), 2);
    }
}
