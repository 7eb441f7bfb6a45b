//! Collection store
//!
//! The `BookStore` owns the authoritative record list and mediates every read
//! and write:
//! - `initialize` merges the seed set with previously persisted records
//! - `add` / `update` / `delete` mutate in memory, then write the full
//!   collection through to storage
//! - `observe` hands out a live view that replays the latest snapshot
//!
//! ## Consistency
//!
//! Mutations are serialized by the storage lock and applied to the published
//! snapshot before storage is touched, so the very next `get` or subscriber
//! sees the change even if the write fails. Write failures are logged, never
//! returned. Readers only ever see a whole snapshot.
//!
//! ## Usage
//!
//! ```ignore
//! let store = BookStore::open(&config);
//! store.initialize().await;
//!
//! let id = store.add(NewBook::new("Dune", "Frank Herbert"));
//! store.update(&id, &BookPatch::new().year(Some("1965".into())));
//!
//! let mut books = store.observe();
//! books.changed().await?;
//! ```

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::models::{Book, BookPatch, NewBook};
use crate::seed::SeedLoader;
use crate::storage::{BookStorage, FileStore, StorageError, StorageResult};

/// Single source of truth for the catalog
pub struct BookStore {
    /// Published record array; receivers replay the latest value
    books: watch::Sender<Vec<Book>>,
    /// True while `initialize` is running
    loading: watch::Sender<bool>,
    /// Durable storage; the lock also serializes mutations
    storage: Mutex<BookStorage>,
    /// Bootstrap source
    seed: SeedLoader,
}

impl BookStore {
    /// Create an empty store; call `initialize` to load records
    pub fn new(storage: BookStorage, seed: SeedLoader) -> Self {
        let (books, _) = watch::channel(Vec::new());
        let (loading, _) = watch::channel(false);
        Self {
            books,
            loading,
            storage: Mutex::new(storage),
            seed,
        }
    }

    /// Create a store backed by files in the configured data directory
    pub fn open(config: &Config) -> Self {
        let storage = BookStorage::new(FileStore::new(&config.data_dir));
        Self::new(storage, SeedLoader::new(config.seed_source()))
    }

    // ==================== Observation ====================

    /// Live record array; the current snapshot is available immediately
    pub fn observe(&self) -> watch::Receiver<Vec<Book>> {
        self.books.subscribe()
    }

    /// Live loading flag
    pub fn loading_observe(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    /// Clone of the current record array
    pub fn snapshot(&self) -> Vec<Book> {
        self.books.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.books.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.borrow().is_empty()
    }

    /// Look up a record in the current snapshot
    pub fn get(&self, id: &str) -> Option<Book> {
        self.books.borrow().iter().find(|b| b.id == id).cloned()
    }

    // ==================== Loading ====================

    /// Load the seed set and merge it with persisted records
    ///
    /// Persisted records whose id is not in the seed set are kept ahead of the
    /// seed records; seed records win id collisions. The merged result is
    /// written back. Not guarded against concurrent calls.
    pub async fn initialize(&self) {
        self.loading.send_replace(true);

        let seed = self.seed.load().await;

        if let Err(e) = self.merge_seed(seed) {
            report("Failed to merge seed with stored records", &e);
            self.restore_persisted();
        }

        self.loading.send_replace(false);
    }

    /// Clear persisted records and load the seed set again
    pub async fn reset_to_seed(&self) {
        let cleared = self.lock_storage().clear();
        if let Err(e) = cleared {
            report("Failed to clear stored records", &e);
        }
        self.initialize().await;
    }

    fn merge_seed(&self, seed: Vec<Book>) -> StorageResult<()> {
        let storage = self.lock_storage();

        let persisted = match storage.load() {
            Ok(books) => books.unwrap_or_default(),
            Err(e @ StorageError::Parse { .. }) => {
                warn!("Ignoring unparseable stored records: {}", e.describe());
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        let merged = merge_records(seed, persisted);
        info!("Catalog loaded with {} records", merged.len());

        self.books.send_replace(merged);
        self.persist(&storage);
        Ok(())
    }

    /// Last resort: whatever is stored, as-is, or nothing
    fn restore_persisted(&self) {
        let storage = self.lock_storage();
        let books = match storage.load() {
            Ok(books) => books.unwrap_or_default(),
            Err(e) => {
                report("Stored records unavailable, starting empty", &e);
                Vec::new()
            }
        };
        self.books.send_replace(books);
    }

    // ==================== Mutations ====================

    /// Add a record at the front of the collection, returning its new id
    ///
    /// No validation happens here; validate with `BookForm` first.
    pub fn add(&self, new: NewBook) -> String {
        let storage = self.lock_storage();

        let id = self.fresh_id();
        let book = Book::from_new(id.clone(), new);
        self.books.send_modify(|books| books.insert(0, book));
        debug!("Added record {}", id);

        self.persist(&storage);
        id
    }

    /// Merge `patch` over the record with `id`
    ///
    /// Returns false when no record matched; the collection is still
    /// republished and persisted.
    pub fn update(&self, id: &str, patch: &BookPatch) -> bool {
        let storage = self.lock_storage();

        let mut found = false;
        self.books.send_modify(|books| {
            if let Some(book) = books.iter_mut().find(|b| b.id == id) {
                patch.apply(book);
                found = true;
            }
        });
        if !found {
            debug!("Update of unknown record {} ignored", id);
        }

        self.persist(&storage);
        found
    }

    /// Remove the record with `id`; returns false when it was not present
    pub fn delete(&self, id: &str) -> bool {
        let storage = self.lock_storage();

        let mut removed = false;
        self.books.send_modify(|books| {
            let before = books.len();
            books.retain(|b| b.id != id);
            removed = books.len() < before;
        });
        if !removed {
            debug!("Delete of unknown record {} ignored", id);
        }

        self.persist(&storage);
        removed
    }

    // ==================== Internals ====================

    fn lock_storage(&self) -> MutexGuard<'_, BookStorage> {
        self.storage.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write the current snapshot through; failures are logged only
    fn persist(&self, storage: &BookStorage) {
        let snapshot = self.snapshot();
        if let Err(e) = storage.save(&snapshot) {
            report(&format!("Failed to persist {} records", snapshot.len()), &e);
        }
    }

    fn fresh_id(&self) -> String {
        let books = self.books.borrow();
        loop {
            let id = Uuid::new_v4().to_string();
            if !books.iter().any(|b| b.id == id) {
                return id;
            }
        }
    }
}

/// Log a storage failure; recoverable ones are warnings
fn report(context: &str, e: &StorageError) {
    if e.is_recoverable() {
        warn!("{}: {}", context, e.describe());
    } else {
        error!("{}: {}", context, e.describe());
    }
}

/// User-added records (persisted ids absent from the seed) followed by the seed
///
/// Each group keeps its incoming order. Repeated ids within a group keep only
/// their first occurrence.
pub fn merge_records(seed: Vec<Book>, persisted: Vec<Book>) -> Vec<Book> {
    let user_added: Vec<Book> = {
        let seed_ids: HashSet<&str> = seed.iter().map(|b| b.id.as_str()).collect();
        persisted
            .into_iter()
            .filter(|p| !seed_ids.contains(p.id.as_str()))
            .collect()
    };

    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(user_added.len() + seed.len());
    for book in user_added.into_iter().chain(seed) {
        if seen.insert(book.id.clone()) {
            merged.push(book);
        } else {
            warn!("Dropping duplicate record id {}", book.id);
        }
    }
    merged
}
