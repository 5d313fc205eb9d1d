//! Persistence layer
//!
//! String-keyed storage for:
//! - Custom themes and their color edit history
//! - Per-account theme selection and night mode
//! - Backgrounds (see `crate::background::persist`)

use std::time::{SystemTime, UNIX_EPOCH};

mod database;
mod kv;
mod memory;
mod settings;
mod sqlite;
mod themes;

pub use database::Database;
pub use kv::{BatchOp, KeyValueStore, StoreBatch, StoreValue};
pub use memory::MemoryStore;
pub use settings::ThemeSettings;
pub use sqlite::SqliteStore;
pub use themes::{CustomThemeInfo, CustomThemeRecord, ThemeStore};

/// Get current Unix timestamp in seconds
#[inline]
pub fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
