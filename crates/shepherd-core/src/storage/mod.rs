//! Durable key-value storage for the signed-in session.
//!
//! This module provides:
//! - `KeyValueStore`: the get/set/remove contract the session layer relies on
//! - `FileStore`: a JSON object on disk, the terminal stand-in for browser storage
//! - `MemoryStore`: an in-process store for tests and throwaway sessions
//!
//! Values are plain UTF-8 text. Nothing is encrypted.

pub mod file;
pub mod memory;

use std::path::PathBuf;

use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Key holding the raw bearer token.
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Key holding the JSON-serialized user profile.
pub const USER_INFO_KEY: &str = "userInfo";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage file {} is corrupt: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to serialize storage contents: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Minimal key-value contract, modeled on browser local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}
