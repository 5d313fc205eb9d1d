//! In-memory store for tests and throwaway sessions

use anyhow::Result;
use parking_lot::RwLock;
use std::collections::BTreeMap;

use super::kv::{BatchOp, KeyValueStore, StoreBatch, StoreValue};

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<BTreeMap<String, StoreValue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }

    /// Snapshot of every key, sorted
    pub fn keys(&self) -> Vec<String> {
        self.values.read().keys().cloned().collect()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<StoreValue>> {
        Ok(self.values.read().get(key).cloned())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .values
            .read()
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }

    fn apply(&self, batch: StoreBatch) -> Result<()> {
        let mut values = self.values.write();
        for op in batch.into_ops() {
            match op {
                BatchOp::Put(key, value) => {
                    values.insert(key, value);
                }
                BatchOp::Remove(key) => {
                    values.remove(&key);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_getters() {
        let store = MemoryStore::new();
        let mut batch = StoreBatch::new();
        batch
            .put_string("name", "cats")
            .put_int("color", 0xd6e4ef)
            .put_bool("blurred", true)
            .put_int_array("colors", vec![1, 2, 3]);
        store.apply(batch).unwrap();

        assert_eq!(store.get_string("name").unwrap().as_deref(), Some("cats"));
        assert_eq!(store.get_int("color").unwrap(), Some(0xd6e4ef));
        assert_eq!(store.get_bool("blurred").unwrap(), Some(true));
        assert_eq!(store.get_int_array("colors").unwrap(), Some(vec![1, 2, 3]));
        // Wrong type reads as missing
        assert_eq!(store.get_bool("name").unwrap(), None);
        assert_eq!(store.get_float("color").unwrap(), Some(0xd6e4ef as f32));
    }

    #[test]
    fn test_prefix_scan_and_remove() {
        let store = MemoryStore::new();
        let mut batch = StoreBatch::new();
        batch
            .put_int("theme_1_a", 1)
            .put_int("theme_1_b", 2)
            .put_int("theme_12_a", 3)
            .put_int("wallpaper", 4);
        store.apply(batch).unwrap();

        assert_eq!(
            store.keys_with_prefix("theme_1_").unwrap(),
            vec!["theme_1_a".to_string(), "theme_1_b".to_string()]
        );

        let mut batch = StoreBatch::new();
        batch.put_int("theme_1_a", 9).remove("theme_1_a");
        store.apply(batch).unwrap();
        assert!(!store.contains("theme_1_a").unwrap());
        assert_eq!(store.len(), 3);
    }
}
