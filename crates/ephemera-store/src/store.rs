use ephemera_types::{decode_collection, encode_collection, Clock, Story, StoryId};
use tracing::{debug, error, info, warn};

use crate::chain::{MediaChain, PersistOutcome};
use crate::config::StoreConfig;
use crate::medium::{MediumInfo, StorageMedium};
use crate::memory::MemoryMedium;
use crate::sqlite::SqliteMedium;

/// The story collection with expiry enforcement.
///
/// Every mutation rewrites the whole collection. No operation here fails:
/// storage problems degrade to fallback media or to in-memory only state.
pub struct StoryStore<C: Clock> {
    media: MediaChain,
    key: String,
    clock: C,
    stories: Vec<Story>,
    last_persist: Option<PersistOutcome>,
}

impl<C: Clock> StoryStore<C> {
    /// Store over explicit media, primary first. Nothing is read until
    /// [`load`](Self::load).
    pub fn new(media: Vec<Box<dyn StorageMedium>>, key: impl Into<String>, clock: C) -> Self {
        Self {
            media: MediaChain::new(media),
            key: key.into(),
            clock,
            stories: Vec::new(),
            last_persist: None,
        }
    }

    /// SQLite primary and in-memory secondary, loaded and pruned.
    ///
    /// If the database cannot be opened the store runs on the session
    /// medium alone.
    pub fn open(config: &StoreConfig, clock: C) -> Self {
        let mut media: Vec<Box<dyn StorageMedium>> = Vec::with_capacity(2);
        match SqliteMedium::open(&config.db_path, config.quota_bytes) {
            Ok(sqlite) => media.push(Box::new(sqlite)),
            Err(e) => warn!(
                "Durable storage at {} unavailable, stories will not survive restart: {}",
                config.db_path.display(),
                e
            ),
        }
        media.push(Box::new(MemoryMedium::new()));

        let mut store = Self::new(media, config.storage_key.clone(), clock);
        store.load();
        store
    }

    /// Current collection, newest first.
    pub fn stories(&self) -> &[Story] {
        &self.stories
    }

    /// Medium holding the current snapshot. `None` before the first read or
    /// write lands, and after a write every medium refused.
    pub fn active_medium(&self) -> Option<MediumInfo> {
        self.media.active()
    }

    /// Outcome of the most recent write, `None` if nothing was written yet.
    ///
    /// [`PersistOutcome::Dropped`] means the in-memory list is newer than
    /// anything stored and will be lost on reload.
    pub fn last_persist(&self) -> Option<PersistOutcome> {
        self.last_persist
    }

    /// Read the persisted collection and drop invalid or expired records,
    /// writing back if anything was dropped.
    pub fn load(&mut self) -> &[Story] {
        let Some(raw) = self.media.read(&self.key) else {
            self.stories.clear();
            return &self.stories;
        };

        let decoded = match decode_collection(&raw) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!("Failed to load stories, starting empty: {}", e);
                self.stories.clear();
                return &self.stories;
            }
        };

        for rejected in &decoded.rejected {
            warn!("Dropping stored story: {}", rejected);
        }

        let now = self.clock.now();
        let total = decoded.stories.len();
        self.stories = decoded
            .stories
            .into_iter()
            .filter(|story| !story.is_expired(now))
            .collect();
        let expired = total - self.stories.len();

        if expired > 0 {
            info!("Pruned {} expired stories on load", expired);
        }
        if expired > 0 || !decoded.rejected.is_empty() {
            self.persist();
        }

        debug!("Loaded {} stories", self.stories.len());
        &self.stories
    }

    /// Prepend a new story holding `image` and persist.
    pub fn create(&mut self, image: impl Into<String>) -> &[Story] {
        let now = self.clock.now();
        let mut id = StoryId::generate(now);
        while self.stories.iter().any(|story| story.id == id) {
            id = StoryId::generate(now);
        }

        self.stories.insert(0, Story::new(id, image, now));
        info!("Created story {} (expires {})", id, self.stories[0].expires_at);
        self.persist();
        &self.stories
    }

    /// Delete the story with exactly this id. Persists only if one was removed.
    pub fn remove(&mut self, id: StoryId) -> &[Story] {
        let before = self.stories.len();
        self.stories.retain(|story| story.id != id);
        if self.stories.len() != before {
            info!("Deleted story {}", id);
            self.persist();
        } else {
            debug!("Delete of unknown story {} ignored", id);
        }
        &self.stories
    }

    /// Drop stories that expired since the last pass. Call right before
    /// opening playback.
    pub fn prune_expired(&mut self) -> &[Story] {
        let now = self.clock.now();
        let before = self.stories.len();
        self.stories.retain(|story| !story.is_expired(now));

        let pruned = before - self.stories.len();
        if pruned > 0 {
            info!("Pruned {} expired stories", pruned);
            self.persist();
        }
        &self.stories
    }

    /// Write the current collection to the first medium that accepts it.
    /// Failure is logged, never returned.
    pub fn persist(&mut self) -> PersistOutcome {
        let data = match encode_collection(&self.stories) {
            Ok(data) => data,
            Err(e) => {
                error!("Failed to serialize stories: {}", e);
                self.last_persist = Some(PersistOutcome::Dropped);
                return PersistOutcome::Dropped;
            }
        };

        let stored = self.media.write(&self.key, &data);
        let outcome = self.media.outcome(stored);
        if let PersistOutcome::Stored { medium, fallback: true } = outcome {
            warn!(
                "Stories saved to fallback {} medium ({:?})",
                medium.name, medium.durability
            );
        }
        self.last_persist = Some(outcome);
        outcome
    }
}
