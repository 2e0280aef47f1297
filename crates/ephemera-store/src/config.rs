use std::path::PathBuf;

/// Key the collection is stored under in every medium.
pub const DEFAULT_STORAGE_KEY: &str = "instagram_stories";

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// SQLite file for the durable medium.
    pub db_path: PathBuf,
    pub storage_key: String,
    /// Byte quota for the durable medium. `None` means unlimited.
    pub quota_bytes: Option<usize>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("ephemera-stories.db"),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            quota_bytes: None,
        }
    }
}

impl StoreConfig {
    /// Read `EPHEMERA_DB_PATH`, `EPHEMERA_STORAGE_KEY` and
    /// `EPHEMERA_QUOTA_BYTES`, falling back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let db_path = std::env::var("EPHEMERA_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);
        let storage_key = std::env::var("EPHEMERA_STORAGE_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .unwrap_or(defaults.storage_key);
        let quota_bytes = std::env::var("EPHEMERA_QUOTA_BYTES")
            .ok()
            .and_then(|v| v.parse().ok());

        Self {
            db_path,
            storage_key,
            quota_bytes,
        }
    }
}
