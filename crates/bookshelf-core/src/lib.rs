//! Bookshelf Core Library
//!
//! This crate provides the state and query core for Bookshelf, a local book
//! catalog: an authoritative record collection persisted on disk, derived
//! views over it, and transient notifications.
//!
//! # Architecture
//!
//! - **Seed**: bootstrap records from a URL, a file, or the built-in list
//! - **Store**: the collection, merged with stored records and written through
//!   on every change
//! - **Query**: pure filter/sort/paginate functions over a snapshot
//!
//! # Quick Start
//!
//! ```text
//! let store = BookStore::open(&Config::load()?);
//! store.initialize().await;
//!
//! // Add a book
//! let form = BookForm { title: "Dune".into(), author: "Frank Herbert".into(), ..Default::default() };
//! let id = store.add(form.into_new_book()?);
//!
//! // Query books
//! let view = derive_view(&store.snapshot(), &ViewParams::default());
//! ```
//!
//! # Modules
//!
//! - `store`: Collection store (main entry point)
//! - `models`: Records, categories, reading status
//! - `query`: Filtering, sorting, pagination
//! - `validation`: Field validators and the edit form
//! - `notify`: Transient notification queue
//! - `seed`: Bootstrap records
//! - `storage`: Durable slot storage
//! - `config`: Application configuration

pub mod config;
pub mod models;
pub mod notify;
pub mod query;
pub mod seed;
pub mod storage;
pub mod store;
pub mod validation;

pub use config::Config;
pub use models::{Book, BookPatch, Category, NewBook, ReadingStatus, Tone, DEFAULT_COVER_IMAGE};
pub use notify::{Notification, NotificationKind, Notifier};
pub use query::{derive_view, BookFilter, DerivedView, SortKey, ViewParams};
pub use seed::{SeedError, SeedLoader, SeedSource};
pub use storage::{BookStorage, StorageError};
pub use store::BookStore;
pub use validation::{BookForm, CategoryChoice, ValidationError, ValidationErrors};
