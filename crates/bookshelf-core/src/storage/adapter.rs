//! Record array persistence
//!
//! `BookStorage` is the only place records cross the serialization boundary.
//! The full collection lives in a single slot as a JSON array; every save
//! overwrites it in full.

use std::fmt;
use std::sync::Arc;

use super::error::{StorageError, StorageResult};
use super::local::KeyValueStore;
use crate::models::Book;

/// Slot holding the record array
pub const STORAGE_KEY: &str = "library_books";

/// Reads and writes the full record array through a slot store
#[derive(Clone)]
pub struct BookStorage {
    backend: Arc<dyn KeyValueStore>,
    key: String,
}

impl BookStorage {
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self::with_key(backend, STORAGE_KEY)
    }

    pub fn with_key(backend: impl KeyValueStore + 'static, key: impl Into<String>) -> Self {
        Self {
            backend: Arc::new(backend),
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Raw slot contents, without parsing
    pub fn load_raw(&self) -> StorageResult<Option<String>> {
        self.backend.get(&self.key)
    }

    /// Stored records; `Ok(None)` when nothing has been saved
    pub fn load(&self) -> StorageResult<Option<Vec<Book>>> {
        let Some(raw) = self.load_raw()? else {
            return Ok(None);
        };

        let books = serde_json::from_str(&raw).map_err(|source| StorageError::Parse {
            key: self.key.clone(),
            source,
        })?;

        Ok(Some(books))
    }

    /// Overwrite the slot with `books`
    pub fn save(&self, books: &[Book]) -> StorageResult<()> {
        let json = serde_json::to_string(books).map_err(StorageError::Serialize)?;
        self.backend.set(&self.key, &json)
    }

    /// Forget everything stored
    pub fn clear(&self) -> StorageResult<()> {
        self.backend.remove(&self.key)
    }
}

impl fmt::Debug for BookStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BookStorage")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewBook, ReadingStatus};
    use crate::seed::builtin_seed;
    use crate::storage::{FileStore, MemoryStore};
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_is_none() {
        let storage = BookStorage::new(MemoryStore::new());
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_round_trip_reproduces_records() {
        let temp_dir = TempDir::new().unwrap();
        let storage = BookStorage::new(FileStore::new(temp_dir.path()));

        let mut books = builtin_seed();
        books.insert(
            0,
            Book::from_new(
                "u-1",
                NewBook::new("Piranesi", "Susanna Clarke")
                    .with_category("Fantasy")
                    .with_cover_image("data:image/png;base64,iVBORw0KGgo=")
                    .with_status(ReadingStatus::Read),
            ),
        );

        storage.save(&books).unwrap();
        assert_eq!(storage.load().unwrap().unwrap(), books);
    }

    #[test]
    fn test_save_overwrites_in_full() {
        let storage = BookStorage::new(MemoryStore::new());
        storage.save(&builtin_seed()).unwrap();
        storage.save(&builtin_seed()[..2]).unwrap();

        assert_eq!(storage.load().unwrap().unwrap().len(), 2);
    }

    #[test]
    fn test_corrupt_slot_is_parse_error() {
        let backend = MemoryStore::new();
        backend.set(STORAGE_KEY, "{\"oops\":").unwrap();
        let storage = BookStorage::new(backend);

        assert!(matches!(storage.load(), Err(StorageError::Parse { .. })));
        assert_eq!(storage.load_raw().unwrap().as_deref(), Some("{\"oops\":"));
    }

    #[test]
    fn test_clear() {
        let storage = BookStorage::new(MemoryStore::new());
        storage.save(&builtin_seed()).unwrap();
        storage.clear().unwrap();
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_custom_key() {
        let backend = MemoryStore::new();
        let storage = BookStorage::with_key(backend.clone(), "other_books");
        storage.save(&[]).unwrap();

        assert_eq!(storage.key(), "other_books");
        assert!(backend.get(STORAGE_KEY).unwrap().is_none());
        assert_eq!(backend.get("other_books").unwrap().as_deref(), Some("[]"));
    }
}
