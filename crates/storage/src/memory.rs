//! In-memory storage backend, for hosts without a data directory and for tests.

use std::collections::BTreeMap;
use super::{Result, Storage};

/// Storage backed by a map. Nothing survives the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    records: BTreeMap<String, serde_json::Value>,
}

impl MemoryStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no record is stored.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    async fn read(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.records.get(key).cloned())
    }

    async fn write(&mut self, key: &str, value: &serde_json::Value) -> Result<()> {
        self.records.insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn remove(&mut self, key: &str) -> Result<()> {
        self.records.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.records.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StorageExt;

    #[tokio::test]
    async fn test_typed_round_trip() {
        let mut storage = MemoryStorage::new();
        storage.save("numbers", &vec![1, 2, 3]).await.unwrap();

        let loaded: Option<Vec<u32>> = storage.load("numbers").await.unwrap();
        assert_eq!(loaded, Some(vec![1, 2, 3]));
        assert_eq!(storage.len(), 1);

        storage.remove("numbers").await.unwrap();
        storage.remove("numbers").await.unwrap();
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_load_wrong_shape_is_json_error() {
        let mut storage = MemoryStorage::new();
        storage.write("k", &serde_json::json!("text")).await.unwrap();

        let loaded = storage.load::<Vec<u32>>("k").await;
        assert!(matches!(loaded, Err(crate::StorageError::Json(_))));
    }
}
