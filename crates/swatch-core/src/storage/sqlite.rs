//! SQLite-backed key-value store

use anyhow::{Context, Result};
use parking_lot::Mutex;
use rusqlite::{params, OptionalExtension};
use std::path::Path;
use tracing::debug;

use super::database::Database;
use super::kv::{BatchOp, KeyValueStore, StoreBatch, StoreValue};
use super::unix_timestamp;

/// Key-value store persisted in the `kv_store` table; values are JSON-encoded
pub struct SqliteStore {
    db: Mutex<Database>,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::new(path)
            .with_context(|| format!("opening store at {}", path.display()))?;
        Ok(Self::new(db))
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(Database::in_memory()?))
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<StoreValue>> {
        let db = self.db.lock();
        let raw: Option<String> = db
            .conn()
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    tracing::warn!("Ignoring undecodable value for {}: {}", key, e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let db = self.db.lock();
        let mut stmt = db
            .conn()
            .prepare("SELECT key FROM kv_store WHERE substr(key, 1, ?2) = ?1 ORDER BY key")?;
        let keys = stmt
            .query_map(params![prefix, prefix.chars().count() as i64], |row| {
                row.get::<_, String>(0)
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(keys)
    }

    fn apply(&self, batch: StoreBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let count = batch.len();
        let now = unix_timestamp() as i64;

        let mut db = self.db.lock();
        let tx = db.conn_mut().transaction()?;
        for op in batch.into_ops() {
            match op {
                BatchOp::Put(key, value) => {
                    let json = serde_json::to_string(&value)?;
                    tx.execute(
                        "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
                         ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3",
                        params![key, json, now],
                    )?;
                }
                BatchOp::Remove(key) => {
                    tx.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
                }
            }
        }
        tx.commit()?;
        debug!("Committed {} store operations", count);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_persists_across_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("swatch.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            let mut batch = StoreBatch::new();
            batch
                .put_string("wallpaper_name", "Z86jxWuHGVECAAAA9XUiUlLRgY0")
                .put_int("wallpaper_type", 2)
                .put_int_array("wallpaper_colors", vec![0xff0000, 0x00ff00, 0x0000ff]);
            store.apply(batch).unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get_int("wallpaper_type").unwrap(), Some(2));
        assert_eq!(
            store.get_int_array("wallpaper_colors").unwrap(),
            Some(vec![0xff0000, 0x00ff00, 0x0000ff])
        );
    }

    #[test]
    fn test_batch_overwrite_and_remove() {
        let store = SqliteStore::in_memory().unwrap();
        store.put("a", StoreValue::Int(1)).unwrap();
        let mut batch = StoreBatch::new();
        batch.put_int("a", 2).put_float("b", 0.5).remove("missing");
        store.apply(batch).unwrap();
        assert_eq!(store.get_int("a").unwrap(), Some(2));
        assert_eq!(store.get_float("b").unwrap(), Some(0.5));

        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
    }

    #[test]
    fn test_prefix_scan() {
        let store = SqliteStore::in_memory().unwrap();
        let mut batch = StoreBatch::new();
        batch
            .put_int("custom_theme_1_name", 1)
            .put_int("custom_theme_1_color_text", 2)
            .put_int("custom_theme_10_name", 3)
            .put_int("custom_themes", 4);
        store.apply(batch).unwrap();
        assert_eq!(
            store.keys_with_prefix("custom_theme_1_").unwrap(),
            vec![
                "custom_theme_1_color_text".to_string(),
                "custom_theme_1_name".to_string()
            ]
        );
    }
}
