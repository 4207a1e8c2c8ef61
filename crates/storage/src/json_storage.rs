//! JSON file storage implementation.
//!
//! Stores each record as a JSON file in a data directory. Writes go to a
//! temporary file that is renamed over the record, so a failed write leaves
//! the previous record in place.

use std::path::{Path, PathBuf};
use super::{Storage, StorageError, Result};
use tokio::fs;

const RECORD_EXT: &str = "json";

/// File-based JSON storage backend.
pub struct JsonStorage {
    root: PathBuf,
}

impl JsonStorage {
    /// Create storage rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Directory holding the records.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, key: &str) -> Result<PathBuf> {
        Ok(self.root.join(format!("{}.{}", encode_key(key)?, RECORD_EXT)))
    }
}

#[async_trait::async_trait]
impl Storage for JsonStorage {
    async fn read(&self, key: &str) -> Result<Option<serde_json::Value>> {
        read_json(&self.record_path(key)?).await
    }

    async fn write(&mut self, key: &str, value: &serde_json::Value) -> Result<()> {
        let path = self.record_path(key)?;
        let json = serde_json::to_string_pretty(value)?;

        let tmp = path.with_extension(format!("{}.tmp", RECORD_EXT));
        fs::write(&tmp, json.as_bytes()).await?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        tracing::trace!(key, path = %path.display(), "record written");
        Ok(())
    }

    async fn remove(&mut self, key: &str) -> Result<()> {
        fs::remove_file(self.record_path(key)?).await.or_else(|e| {
            if e.kind() == std::io::ErrorKind::NotFound { Ok(()) } else { Err(e) }
        })?;
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut rd = fs::read_dir(&self.root).await?;
        while let Some(entry) = rd.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some(RECORD_EXT) {
                continue;
            }
            if let Some(key) = path.file_stem().and_then(|s| s.to_str()).and_then(decode_key) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}

async fn read_json(path: &Path) -> Result<Option<serde_json::Value>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Percent-encode everything outside `[A-Za-z0-9_-]` so any key maps to a
/// single safe file name.
fn encode_key(key: &str) -> Result<String> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    let mut out = String::with_capacity(key.len());
    for b in key.bytes() {
        if b.is_ascii_alphanumeric() || b == b'_' || b == b'-' {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    Ok(out)
}

fn decode_key(name: &str) -> Option<String> {
    let bytes = name.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = name.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}
