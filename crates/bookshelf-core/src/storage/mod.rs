//! Storage layer
//!
//! Durable local storage for the catalog.
//!
//! ## Architecture
//!
//! - **`KeyValueStore`**: string-keyed slots (`FileStore` on disk, `MemoryStore`
//!   in process). A server-backed slot store can replace either without the
//!   collection store noticing.
//! - **`BookStorage`**: the serialization boundary. One slot holds the full
//!   JSON record array and is overwritten on every write.

pub mod adapter;
pub mod error;
pub mod local;

pub use adapter::{BookStorage, STORAGE_KEY};
pub use error::{StorageError, StorageResult};
pub use local::{FileStore, KeyValueStore, MemoryStore};
