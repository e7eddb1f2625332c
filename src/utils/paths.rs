use dirs::home_dir;
use std::{env, path::PathBuf};

pub const HOME_ENV: &str = "INVENTORY_CORE_HOME";

const DEFAULT_DIR_NAME: &str = ".inventory_core";
const STORE_FILE: &str = "inventory.json";
const BACKUP_DIR: &str = "backups";
const CONFIG_FILE: &str = "config.json";
const HISTORY_FILE: &str = "history.txt";

/// Returns the application data directory, defaulting to `~/.inventory_core`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

/// Path of the JSON document store inside `base`.
pub fn store_file_in(base: &std::path::Path) -> PathBuf {
    base.join(STORE_FILE)
}

pub fn backups_dir_in(base: &std::path::Path) -> PathBuf {
    base.join(BACKUP_DIR)
}

pub fn config_file_in(base: &std::path::Path) -> PathBuf {
    base.join(CONFIG_FILE)
}

/// Line-editor history for the interactive shell.
pub fn history_file() -> PathBuf {
    app_data_dir().join(HISTORY_FILE)
}
