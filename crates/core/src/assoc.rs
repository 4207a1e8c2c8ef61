//! Association-list encoding for mapping-typed record fields.
//!
//! Persisted records store maps as ordered `[key, value]` pairs rather than
//! JSON objects. Use with `#[serde(with = "crate::assoc")]` on a `BTreeMap`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Serialize a map as a sequence of `[key, value]` pairs.
pub fn serialize<K, V, S>(map: &BTreeMap<K, V>, serializer: S) -> Result<S::Ok, S::Error>
where
    K: Serialize,
    V: Serialize,
    S: Serializer,
{
    serializer.collect_seq(map.iter())
}

/// Rebuild a map from a sequence of `[key, value]` pairs. Later pairs win.
pub fn deserialize<'de, K, V, D>(deserializer: D) -> Result<BTreeMap<K, V>, D::Error>
where
    K: Deserialize<'de> + Ord,
    V: Deserialize<'de>,
    D: Deserializer<'de>,
{
    let pairs: Vec<(K, V)> = Vec::deserialize(deserializer)?;
    Ok(pairs.into_iter().collect())
}
