//! Storage trait abstraction.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Record key that cannot be stored
    #[error("Invalid key: {0:?}")]
    InvalidKey(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Record keys used by the tutorial stores.
pub mod keys {
    /// Overall progress record.
    pub const PROGRESS: &str = "tutorial_progress";

    /// Overall statistics record.
    pub const STATS: &str = "tutorial_stats";

    /// Per-tour snapshot record.
    pub fn tour_progress(tour_id: &str) -> String {
        format!("tour_progress_{}", tour_id)
    }

    /// Per-step last-attempt timestamp record of a tour.
    pub fn tour_step(tour_id: &str, step_id: &str) -> String {
        format!("tour_step_{}_{}", tour_id, step_id)
    }
}

/// Durable key-value storage for JSON records.
///
/// This trait allows different storage backends to be plugged in. A write
/// either replaces the whole record or leaves the previous one untouched.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Read a record.
    async fn read(&self, key: &str) -> Result<Option<serde_json::Value>>;

    /// Write (create or replace) a record.
    async fn write(&mut self, key: &str, value: &serde_json::Value) -> Result<()>;

    /// Delete a record. Deleting a missing record succeeds.
    async fn remove(&mut self, key: &str) -> Result<()>;

    /// List all record keys.
    async fn keys(&self) -> Result<Vec<String>>;
}

/// Typed helpers over [`Storage`].
#[async_trait]
pub trait StorageExt: Storage {
    /// Load and deserialize a record.
    async fn load<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>> {
        match self.read(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Serialize and save a record.
    async fn save<T: Serialize + Sync>(&mut self, key: &str, record: &T) -> Result<()> {
        let value = serde_json::to_value(record)?;
        self.write(key, &value).await
    }
}

impl<S: Storage + ?Sized> StorageExt for S {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keys() {
        assert_eq!(keys::tour_progress("intro"), "tour_progress_intro");
        assert_eq!(keys::tour_step("intro", "pop"), "tour_step_intro_pop");
    }
}
