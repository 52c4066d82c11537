//! Storage initialization
//!
//! Handles first-run setup: directories, settings and empty data files

use crate::config::paths::MonthwisePaths;
use crate::config::settings::Settings;
use crate::error::LedgerError;

use super::categories::CategoryData;
use super::file_io::write_json_atomic;
use super::wallets::WalletData;

/// Initialize storage for a fresh installation
///
/// Existing files are left alone, so running it twice is harmless.
pub fn initialize_storage(paths: &MonthwisePaths) -> Result<Settings, LedgerError> {
    paths.ensure_directories()?;

    let settings = Settings::load_or_create(paths)?;
    if !paths.settings_file().exists() {
        settings.save(paths)?;
    }

    if !paths.categories_file().exists() {
        write_json_atomic(paths.categories_file(), &CategoryData::default())?;
    }

    if !paths.wallets_file().exists() {
        write_json_atomic(paths.wallets_file(), &WalletData::default())?;
    }

    Ok(settings)
}
