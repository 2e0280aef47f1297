use tracing::{error, warn};

use crate::medium::{MediumInfo, StorageMedium};

/// Where a persist call ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    /// Written to `medium`. `fallback` is true when an earlier medium refused.
    Stored { medium: MediumInfo, fallback: bool },
    /// Every medium refused, or the collection could not be serialized.
    Dropped,
}

/// Storage media tried in priority order.
///
/// The medium that accepted the most recent write (or served the most
/// recent read) is authoritative. After a successful write the key is
/// removed from every other medium so only one snapshot exists.
pub struct MediaChain {
    media: Vec<Box<dyn StorageMedium>>,
    active: Option<usize>,
}

impl MediaChain {
    pub fn new(media: Vec<Box<dyn StorageMedium>>) -> Self {
        Self {
            media,
            active: None,
        }
    }

    pub fn len(&self) -> usize {
        self.media.len()
    }

    pub fn is_empty(&self) -> bool {
        self.media.is_empty()
    }

    pub fn active(&self) -> Option<MediumInfo> {
        self.active.map(|idx| self.media[idx].info())
    }

    /// First non-empty value for `key`. Read errors fall through to the
    /// next medium.
    pub fn read(&mut self, key: &str) -> Option<String> {
        for (idx, medium) in self.media.iter().enumerate() {
            match medium.get(key) {
                Ok(Some(value)) if !value.trim().is_empty() => {
                    self.active = Some(idx);
                    return Some(value);
                }
                Ok(_) => {}
                Err(e) => warn!("Read from {} medium failed: {}", medium.info().name, e),
            }
        }
        None
    }

    /// Write `value` to the first medium that accepts it. When every
    /// medium refuses, no medium is active until the next successful write.
    pub fn write(&mut self, key: &str, value: &str) -> Option<usize> {
        let mut stored = None;
        for (idx, medium) in self.media.iter_mut().enumerate() {
            match medium.set(key, value) {
                Ok(()) => {
                    stored = Some(idx);
                    break;
                }
                Err(e) => warn!(
                    "Write of {} bytes to {} medium failed: {}",
                    value.len(),
                    medium.info().name,
                    e
                ),
            }
        }

        let Some(idx) = stored else {
            error!("All storage media refused the write; changes kept in memory only");
            self.active = None;
            return None;
        };

        for (other, medium) in self.media.iter_mut().enumerate() {
            if other == idx {
                continue;
            }
            if let Err(e) = medium.remove(key) {
                warn!("Failed to clear stale copy in {} medium: {}", medium.info().name, e);
            }
        }

        self.active = Some(idx);
        Some(idx)
    }

    pub(crate) fn outcome(&self, stored: Option<usize>) -> PersistOutcome {
        match stored {
            Some(idx) => PersistOutcome::Stored {
                medium: self.media[idx].info(),
                fallback: idx > 0,
            },
            None => PersistOutcome::Dropped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryMedium;
    use crate::medium::Durability;

    #[test]
    fn falls_back_and_clears_stale_copies() {
        let primary = MemoryMedium::with_quota(4).durable();
        let secondary = MemoryMedium::new();
        let mut chain =
            MediaChain::new(vec![Box::new(primary.clone()), Box::new(secondary.clone())]);

        assert_eq!(chain.write("k", "tiny"), Some(0));
        assert_eq!(chain.write("k", "much too big"), Some(1));
        // The stale primary snapshot is gone, so reads find the newest one.
        assert_eq!(primary.peek("k"), None);
        assert_eq!(chain.read("k").as_deref(), Some("much too big"));
        assert_eq!(chain.active().map(|m| m.durability), Some(Durability::Session));

        assert_eq!(chain.write("k", "ok"), Some(0));
        assert_eq!(secondary.peek("k"), None);
    }

    #[test]
    fn read_skips_empty_and_failing_media() {
        let mut primary = MemoryMedium::new();
        let mut secondary = MemoryMedium::new();
        primary.set("k", "").unwrap();
        secondary.set("k", "[]").unwrap();
        let mut chain = MediaChain::new(vec![Box::new(primary.clone()), Box::new(secondary)]);
        assert_eq!(chain.read("k").as_deref(), Some("[]"));

        primary.set("k", "primary").unwrap();
        primary.set_unavailable(true);
        assert_eq!(chain.read("k").as_deref(), Some("[]"));
    }

    #[test]
    fn total_failure_is_dropped() {
        let primary = MemoryMedium::with_quota(0);
        let secondary = MemoryMedium::with_quota(0);
        let mut chain = MediaChain::new(vec![Box::new(primary), Box::new(secondary)]);
        let stored = chain.write("k", "v");
        assert_eq!(stored, None);
        assert_eq!(chain.outcome(stored), PersistOutcome::Dropped);
        assert_eq!(chain.active(), None);
    }

    #[test]
    fn refused_write_clears_active_medium() {
        let primary = MemoryMedium::with_quota(8).durable();
        let secondary = MemoryMedium::with_quota(8);
        let mut chain =
            MediaChain::new(vec![Box::new(primary.clone()), Box::new(secondary.clone())]);

        assert_eq!(chain.write("k", "small"), Some(0));
        assert_eq!(chain.active().map(|m| m.durability), Some(Durability::Durable));

        assert_eq!(chain.write("k", "far too large"), None);
        assert_eq!(chain.active(), None);
        // The old snapshot is still on disk but no longer reported as current.
        assert_eq!(primary.peek("k").as_deref(), Some("small"));
        assert_eq!(secondary.peek("k"), None);
    }
}
