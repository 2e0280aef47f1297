use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::medium::{Durability, MediumInfo, StorageError, StorageMedium};

#[derive(Default)]
struct Shared {
    values: Mutex<HashMap<String, String>>,
    writes: AtomicUsize,
    unavailable: AtomicBool,
}

/// Session-scoped medium held in process memory.
///
/// Clones share the same map, so a caller can hand one clone to the store
/// and keep another to inspect or sabotage it.
#[derive(Clone, Default)]
pub struct MemoryMedium {
    shared: Arc<Shared>,
    quota_bytes: Option<usize>,
    durability: Option<Durability>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    /// Medium that rejects writes once the stored bytes would exceed `quota`.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            quota_bytes: Some(quota),
            ..Self::default()
        }
    }

    /// Report this medium as durable. Lets tests stand in a memory map for a
    /// primary medium.
    pub fn durable(mut self) -> Self {
        self.durability = Some(Durability::Durable);
        self
    }

    /// Number of successful `set` calls so far.
    pub fn write_count(&self) -> usize {
        self.shared.writes.load(Ordering::SeqCst)
    }

    /// Make every operation fail with [`StorageError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.shared.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Current raw value, bypassing availability.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.shared
            .values
            .lock()
            .ok()
            .and_then(|values| values.get(key).cloned())
    }

    fn values(&self) -> Result<MutexGuard<'_, HashMap<String, String>>, StorageError> {
        if self.shared.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("memory medium disabled".into()));
        }
        self.shared
            .values
            .lock()
            .map_err(|e| StorageError::Unavailable(format!("memory medium lock poisoned: {}", e)))
    }
}

impl StorageMedium for MemoryMedium {
    fn info(&self) -> MediumInfo {
        MediumInfo {
            name: "memory",
            durability: self.durability.unwrap_or(Durability::Session),
        }
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values()?.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let quota = self.quota_bytes;
        let mut values = self.values()?;
        if let Some(quota) = quota {
            let used: usize = values
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            if used + value.len() > quota {
                return Err(StorageError::Capacity {
                    needed: value.len(),
                    limit: Some(quota),
                });
            }
        }
        values.insert(key.to_string(), value.to_string());
        self.shared.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.values()?.remove(key);
        Ok(())
    }
}
