//! Wallet repository
//!
//! `wallets.json` is written by the wallet service. The ledger only reads it;
//! a missing file means no wallets.

use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{Wallet, WalletId};

use super::file_io::read_json;

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct WalletData {
    pub wallets: Vec<Wallet>,
}

pub struct WalletRepository {
    path: PathBuf,
    wallets: RwLock<Vec<Wallet>>,
}

impl WalletRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            wallets: RwLock::new(Vec::new()),
        }
    }

    /// Load wallets from disk
    pub fn load(&self) -> LedgerResult<()> {
        let file_data: WalletData = read_json(&self.path)?;

        let mut wallets = self
            .wallets
            .write()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire write lock: {}", e)))?;
        *wallets = file_data.wallets;

        Ok(())
    }

    /// All wallets in file order
    pub fn get_all(&self) -> LedgerResult<Vec<Wallet>> {
        let wallets = self
            .wallets
            .read()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire read lock: {}", e)))?;
        Ok(wallets.clone())
    }

    pub fn get(&self, id: WalletId) -> LedgerResult<Option<Wallet>> {
        let wallets = self
            .wallets
            .read()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire read lock: {}", e)))?;
        Ok(wallets.iter().find(|w| w.id == id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WalletType;
    use crate::storage::file_io::write_json_atomic;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let repo = WalletRepository::new(temp_dir.path().join("wallets.json"));
        repo.load().unwrap();
        assert!(repo.get_all().unwrap().is_empty());
    }

    #[test]
    fn test_load_external_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("wallets.json");
        let savings = Wallet::new("Rainy Day", WalletType::Savings).savings(true);
        let data = WalletData {
            wallets: vec![Wallet::new("Checking", WalletType::Checking), savings.clone()],
        };
        write_json_atomic(&path, &data).unwrap();

        let repo = WalletRepository::new(path);
        repo.load().unwrap();
        assert_eq!(repo.get_all().unwrap().len(), 2);
        assert_eq!(repo.get(savings.id).unwrap(), Some(savings));
    }
}
