/// Durable story collection with a fixed 24 hour lifetime.
///
/// The store reads and writes the whole collection through an ordered chain
/// of key/value media: a SQLite file first, process memory as the
/// session-scoped fallback.

pub mod chain;
pub mod config;
pub mod medium;
pub mod memory;
pub mod sqlite;
pub mod store;

pub use chain::{MediaChain, PersistOutcome};
pub use config::{StoreConfig, DEFAULT_STORAGE_KEY};
pub use medium::{Durability, MediumInfo, StorageError, StorageMedium};
pub use memory::MemoryMedium;
pub use sqlite::SqliteMedium;
pub use store::StoryStore;
