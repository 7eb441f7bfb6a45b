//! Key-value slot stores
//!
//! `FileStore` keeps one file per key under a data directory and writes
//! atomically (write to temp file, then rename) so a slot is never left
//! partially written. `MemoryStore` keeps slots in process memory; clones share
//! the same slots, which lets tests simulate a restart against "the same disk".
//!
//! Storage location: `~/.local/share/bookshelf/` (configurable via `Config`)

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use super::error::{StorageError, StorageResult};

/// String-keyed durable slots
pub trait KeyValueStore: Send + Sync {
    /// Read a slot; `None` when it was never written or has been removed
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Overwrite a slot in full
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove a slot; removing a missing slot succeeds
    fn remove(&self, key: &str) -> StorageResult<()>;
}

/// Slots stored as `<data_dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path backing `key`
    pub fn slot_path(&self, key: &str) -> StorageResult<PathBuf> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(StorageError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.slot_path(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::from_read_io(e, path)),
        }
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.slot_path(key)?;
        atomic_write(&path, value.as_bytes())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let path = self.slot_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::from_io(e, path)),
        }
    }
}

/// In-process slots
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.remove(key);
        Ok(())
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StorageError::from_io(e, parent.to_path_buf()))?;
    }

    // Same directory, so the rename stays on one filesystem
    let temp_path = path.with_extension("tmp");

    let mut file =
        File::create(&temp_path).map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    file.write_all(data)
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    file.sync_all()
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    fs::rename(&temp_path, path).map_err(|source| StorageError::AtomicWriteFailed {
        from: temp_path.clone(),
        to: path.to_path_buf(),
        source,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_set_get_remove() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());

        assert!(store.get("library_books").unwrap().is_none());

        store.set("library_books", "[]").unwrap();
        assert_eq!(store.get("library_books").unwrap().as_deref(), Some("[]"));
        assert!(temp_dir.path().join("library_books.json").exists());

        store.set("library_books", "[1]").unwrap();
        assert_eq!(store.get("library_books").unwrap().as_deref(), Some("[1]"));

        store.remove("library_books").unwrap();
        assert!(store.get("library_books").unwrap().is_none());

        // Removing twice is fine
        store.remove("library_books").unwrap();
    }

    #[test]
    fn test_file_store_rejects_path_like_keys() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());

        for key in ["", "../escape", "a/b", ".hidden"] {
            assert!(matches!(
                store.set(key, "x"),
                Err(StorageError::InvalidKey { .. })
            ));
        }
    }

    #[test]
    fn test_file_store_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());
        store.set("slot", "value").unwrap();

        assert!(!temp_dir.path().join("slot.tmp").exists());
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir
            .path()
            .join("a")
            .join("b")
            .join("c")
            .join("file.txt");

        atomic_write(&nested_path, b"test data").unwrap();

        assert!(nested_path.exists());
        let content = fs::read_to_string(&nested_path).unwrap();
        assert_eq!(content, "test data");
    }

    #[test]
    fn test_memory_store_clones_share_slots() {
        let store = MemoryStore::new();
        let other = store.clone();

        store.set("k", "v").unwrap();
        assert_eq!(other.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(other.len(), 1);

        other.remove("k").unwrap();
        assert!(store.is_empty());
    }
}
