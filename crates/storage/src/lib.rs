//! Storage abstraction and implementations for tutorial state.
//!
//! This crate provides a trait-based key-value interface over JSON records
//! with a file-backed and an in-memory implementation.

#![warn(missing_docs)]

pub mod trait_;
#[cfg(feature = "json")]
pub mod json_storage;
pub mod memory;

pub use trait_::{keys, Storage, StorageError, StorageExt, Result};
#[cfg(feature = "json")]
pub use json_storage::JsonStorage;
pub use memory::MemoryStorage;
