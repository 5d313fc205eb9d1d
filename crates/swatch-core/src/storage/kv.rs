//! Key-value store contract
//!
//! Everything the engine persists (custom themes, account settings, backgrounds) goes
//! through string keys. Writes are collected in a [`StoreBatch`] and committed together.

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A single persisted value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum StoreValue {
    String(String),
    Int(i64),
    Bool(bool),
    Float(f32),
    IntArray(Vec<i64>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum BatchOp {
    Put(String, StoreValue),
    Remove(String),
}

/// Pending writes, committed with [`KeyValueStore::apply`]
#[derive(Debug, Clone, Default)]
pub struct StoreBatch {
    ops: Vec<BatchOp>,
}

impl StoreBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: impl Into<String>, value: StoreValue) -> &mut Self {
        self.ops.push(BatchOp::Put(key.into(), value));
        self
    }

    pub fn put_string(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.put(key, StoreValue::String(value.into()))
    }

    pub fn put_int(&mut self, key: impl Into<String>, value: i64) -> &mut Self {
        self.put(key, StoreValue::Int(value))
    }

    pub fn put_bool(&mut self, key: impl Into<String>, value: bool) -> &mut Self {
        self.put(key, StoreValue::Bool(value))
    }

    pub fn put_float(&mut self, key: impl Into<String>, value: f32) -> &mut Self {
        self.put(key, StoreValue::Float(value))
    }

    pub fn put_int_array(&mut self, key: impl Into<String>, values: Vec<i64>) -> &mut Self {
        self.put(key, StoreValue::IntArray(values))
    }

    pub fn remove(&mut self, key: impl Into<String>) -> &mut Self {
        self.ops.push(BatchOp::Remove(key.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<BatchOp> {
        self.ops
    }

    /// Append all ops from `other`, preserving order
    pub fn extend(&mut self, other: StoreBatch) -> &mut Self {
        self.ops.extend(other.ops);
        self
    }
}

/// Persistent string-keyed store
///
/// Typed getters return `Ok(None)` both for missing keys and for values stored under a
/// different type.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<StoreValue>>;

    /// All keys starting with `prefix`, sorted
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;

    /// Commit a batch; later ops win over earlier ones on the same key
    fn apply(&self, batch: StoreBatch) -> Result<()>;

    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(match self.get(key)? {
            Some(StoreValue::String(value)) => Some(value),
            _ => None,
        })
    }

    fn get_int(&self, key: &str) -> Result<Option<i64>> {
        Ok(match self.get(key)? {
            Some(StoreValue::Int(value)) => Some(value),
            _ => None,
        })
    }

    fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        Ok(match self.get(key)? {
            Some(StoreValue::Bool(value)) => Some(value),
            _ => None,
        })
    }

    fn get_float(&self, key: &str) -> Result<Option<f32>> {
        Ok(match self.get(key)? {
            Some(StoreValue::Float(value)) => Some(value),
            Some(StoreValue::Int(value)) => Some(value as f32),
            _ => None,
        })
    }

    fn get_int_array(&self, key: &str) -> Result<Option<Vec<i64>>> {
        Ok(match self.get(key)? {
            Some(StoreValue::IntArray(values)) => Some(values),
            _ => None,
        })
    }

    /// Single-op convenience over [`KeyValueStore::apply`]
    fn put(&self, key: &str, value: StoreValue) -> Result<()> {
        let mut batch = StoreBatch::new();
        batch.put(key, value);
        self.apply(batch)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut batch = StoreBatch::new();
        batch.remove(key);
        self.apply(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_serde_shape() {
        let json = serde_json::to_string(&StoreValue::IntArray(vec![1, -2])).unwrap();
        assert_eq!(json, r#"{"type":"int_array","value":[1,-2]}"#);
        let back: StoreValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, StoreValue::IntArray(vec![1, -2]));
    }

    #[test]
    fn test_batch_builder_keeps_order() {
        let mut batch = StoreBatch::new();
        batch.put_int("a", 1).remove("a").put_bool("b", true);
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.ops()[1], BatchOp::Remove("a".into()));
    }
}
