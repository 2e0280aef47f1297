use thiserror::Error;

/// Errors a storage medium can report.
///
/// These never escape [`crate::StoryStore`]; the store falls back to the
/// next medium or logs and drops the write.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage capacity exceeded writing {needed} bytes")]
    Capacity { needed: usize, limit: Option<usize> },
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("storage medium unavailable: {0}")]
    Unavailable(String),
}

/// How long data written to a medium survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Durability {
    /// Survives process restarts.
    Durable,
    /// Lost when the session ends.
    Session,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediumInfo {
    pub name: &'static str,
    pub durability: Durability,
}

/// A string key/value backend.
pub trait StorageMedium: Send {
    fn info(&self) -> MediumInfo;

    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`. May fail with [`StorageError::Capacity`].
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}
