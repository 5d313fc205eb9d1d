//! Filesystem locations

use std::path::PathBuf;

use crate::constants::dirs::{CONFIG_DIR_NAME, DATABASE_FILE_NAME};

/// Root config directory (~/.swatch)
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Config file (~/.swatch/config.toml)
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Default database file (~/.swatch/swatch.db)
pub fn database_path() -> PathBuf {
    config_dir().join(DATABASE_FILE_NAME)
}

/// Log directory (~/.swatch/logs)
pub fn logs_dir() -> PathBuf {
    config_dir().join("logs")
}
