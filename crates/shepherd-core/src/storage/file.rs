use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{KeyValueStore, StorageError};

/// Storage file name in the cache directory
pub const STORAGE_FILE: &str = "storage.json";

/// Key-value store backed by a single JSON object on disk.
///
/// The file is re-read on every access so that it behaves like browser
/// storage: whatever is on disk is the truth. Writes go to a sibling temp
/// file first and are renamed into place.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at `<dir>/storage.json`
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(STORAGE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Entries for a read-modify-write. A corrupt file is replaced.
    fn entries_for_write(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match self.read_entries() {
            Err(StorageError::Corrupt { path, source }) => {
                warn!(path = %path.display(), error = %source, "Overwriting corrupt storage file");
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if entries.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path)?;
            }
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), keys = entries.len(), "Storage written");
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries_for_write()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries_for_write()?;
        entries.remove(key);
        self.write_entries(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::in_dir(dir.path());
        store.set("accessToken", "abc").unwrap();
        store.set("userInfo", r#"{"id":1}"#).unwrap();

        let reopened = FileStore::in_dir(dir.path());
        assert_eq!(reopened.get("accessToken").unwrap().as_deref(), Some("abc"));
        assert_eq!(reopened.get("userInfo").unwrap().as_deref(), Some(r#"{"id":1}"#));
        assert_eq!(reopened.get("missing").unwrap(), None);
    }

    #[test]
    fn test_removing_last_key_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::in_dir(dir.path());
        store.set("accessToken", "abc").unwrap();
        assert!(store.path().exists());

        store.remove("accessToken").unwrap();
        assert!(!store.path().exists());
        store.remove("accessToken").unwrap();
    }

    #[test]
    fn test_creates_missing_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::in_dir(&dir.path().join("nested").join("deeper"));
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_corrupt_file_reports_error_then_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::in_dir(dir.path());
        std::fs::write(store.path(), "not json at all").unwrap();

        assert!(matches!(store.get("accessToken"), Err(StorageError::Corrupt { .. })));

        store.remove("accessToken").unwrap();
        assert!(!store.path().exists());
        assert_eq!(store.get("accessToken").unwrap(), None);

        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }
}
