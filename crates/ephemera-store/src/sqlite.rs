use rusqlite::{Connection, ErrorCode, OptionalExtension};
use std::path::Path;
use tracing::info;

use crate::medium::{Durability, MediumInfo, StorageError, StorageMedium};

/// Durable key/value medium backed by a single SQLite file.
///
/// Values live in one `kv` table. An optional quota caps the total bytes
/// stored across all keys, mimicking a browser's per-origin storage limit.
pub struct SqliteMedium {
    conn: Connection,
    quota_bytes: Option<usize>,
}

impl SqliteMedium {
    pub fn open(path: &Path, quota_bytes: Option<usize>) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        run_migrations(&conn)?;

        info!("Story DB opened at {}", path.display());
        Ok(Self { conn, quota_bytes })
    }

    /// Private in-memory database, mostly for tests.
    pub fn open_in_memory(quota_bytes: Option<usize>) -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;
        Ok(Self { conn, quota_bytes })
    }

    fn bytes_used_excluding(&self, key: &str) -> Result<usize, StorageError> {
        let used: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(LENGTH(CAST(value AS BLOB))), 0) FROM kv WHERE key != ?1",
            [key],
            |row| row.get(0),
        )?;
        Ok(used.max(0) as usize)
    }
}

impl StorageMedium for SqliteMedium {
    fn info(&self) -> MediumInfo {
        MediumInfo {
            name: "sqlite",
            durability: Durability::Durable,
        }
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let needed = value.len();
        if let Some(quota) = self.quota_bytes {
            if self.bytes_used_excluding(key)? + needed > quota {
                return Err(StorageError::Capacity {
                    needed,
                    limit: Some(quota),
                });
            }
        }

        self.conn
            .execute(
                "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                (key, value),
            )
            .map_err(|e| match e.sqlite_error_code() {
                Some(ErrorCode::DiskFull) => StorageError::Capacity {
                    needed,
                    limit: None,
                },
                _ => StorageError::Sqlite(e),
            })?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }
}

fn run_migrations(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);"
    )?;

    let version: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Story DB: running migration v1 (key/value table)");
        conn.execute_batch(
            "
            CREATE TABLE kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            INSERT INTO schema_version (version) VALUES (1);
            "
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let mut medium = SqliteMedium::open_in_memory(None).unwrap();
        assert_eq!(medium.get("k").unwrap(), None);

        medium.set("k", "one").unwrap();
        medium.set("k", "two").unwrap();
        assert_eq!(medium.get("k").unwrap().as_deref(), Some("two"));

        medium.remove("k").unwrap();
        assert_eq!(medium.get("k").unwrap(), None);
    }

    #[test]
    fn quota_counts_other_keys_only() {
        let mut medium = SqliteMedium::open_in_memory(Some(10)).unwrap();
        medium.set("a", "123456").unwrap();
        // Overwriting the same key does not double count.
        medium.set("a", "1234567890").unwrap();

        let err = medium.set("b", "x").unwrap_err();
        assert!(matches!(err, StorageError::Capacity { needed: 1, limit: Some(10) }));
        assert_eq!(medium.get("b").unwrap(), None);
    }

    #[test]
    fn migrations_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stories.db");
        {
            let mut medium = SqliteMedium::open(&path, None).unwrap();
            medium.set("k", "kept").unwrap();
        }
        let medium = SqliteMedium::open(&path, None).unwrap();
        assert_eq!(medium.get("k").unwrap().as_deref(), Some("kept"));
    }
}
