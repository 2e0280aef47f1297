/// Integration tests: the store over a real SQLite file, reopened the way
/// a restarted process would see it.

use chrono::TimeDelta;
use ephemera_store::{Durability, SqliteMedium, StorageMedium, StoreConfig, StoryStore};
use ephemera_types::{decode_collection, ManualClock};

fn config(dir: &tempfile::TempDir, quota_bytes: Option<usize>) -> StoreConfig {
    StoreConfig {
        db_path: dir.path().join("stories.db"),
        quota_bytes,
        ..StoreConfig::default()
    }
}

fn raw_value(config: &StoreConfig) -> Option<String> {
    let sqlite = SqliteMedium::open(&config.db_path, None).unwrap();
    sqlite.get(&config.storage_key).unwrap()
}

#[test]
fn stories_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir, None);
    let clock = ManualClock::at_millis(1_700_000_000_000);

    let created = {
        let mut store = StoryStore::open(&config, clock.clone());
        assert!(store.stories().is_empty());
        store.create("data:image/png;base64,AAAA");
        clock.advance_millis(1_000);
        store.create("data:image/png;base64,BBBB");
        assert_eq!(store.active_medium().unwrap().durability, Durability::Durable);
        store.stories().to_vec()
    };

    let reopened = StoryStore::open(&config, clock.clone());
    assert_eq!(reopened.stories(), created.as_slice());
    assert_eq!(reopened.stories()[0].image, "data:image/png;base64,BBBB");
    assert_eq!(reopened.active_medium().unwrap().name, "sqlite");
}

#[test]
fn expired_stories_are_gone_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir, None);
    let clock = ManualClock::at_millis(1_700_000_000_000);

    {
        let mut store = StoryStore::open(&config, clock.clone());
        store.create("data:old");
        clock.advance(TimeDelta::hours(12));
        store.create("data:new");
    }

    // The first story hits its 24h mark exactly.
    clock.advance(TimeDelta::hours(12));
    let store = StoryStore::open(&config, clock.clone());
    assert_eq!(store.stories().len(), 1);
    assert_eq!(store.stories()[0].image, "data:new");

    // The pruned collection was written back.
    let decoded = decode_collection(&raw_value(&config).unwrap()).unwrap();
    assert_eq!(decoded.stories.len(), 1);
    assert!(decoded.rejected.is_empty());
}

#[test]
fn prune_before_playback_writes_back() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir, None);
    let clock = ManualClock::at_millis(1_700_000_000_000);

    let mut store = StoryStore::open(&config, clock.clone());
    store.create("data:a");
    clock.advance(TimeDelta::hours(25));
    assert_eq!(store.stories().len(), 1);

    assert!(store.prune_expired().is_empty());
    assert_eq!(raw_value(&config).as_deref(), Some("[]"));
}

#[test]
fn quota_overflow_falls_back_to_session_memory() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir, Some(16));
    let clock = ManualClock::at_millis(1_700_000_000_000);

    let mut store = StoryStore::open(&config, clock.clone());
    store.create("data:image/png;base64,far-too-large-for-sixteen-bytes");

    assert_eq!(store.stories().len(), 1);
    let medium = store.active_medium().unwrap();
    assert_eq!(medium.name, "memory");
    assert_eq!(medium.durability, Durability::Session);
    assert_eq!(raw_value(&config), None);

    // Session storage does not outlive the store.
    drop(store);
    let reopened = StoryStore::open(&config, clock);
    assert!(reopened.stories().is_empty());
}

#[test]
fn corrupt_database_value_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir, None);
    {
        let mut sqlite = SqliteMedium::open(&config.db_path, None).unwrap();
        sqlite.set(&config.storage_key, "{not json").unwrap();
    }

    let mut store = StoryStore::open(&config, ManualClock::at_millis(1_700_000_000_000));
    assert!(store.stories().is_empty());
    // Unparseable data is left alone until the next real write.
    assert_eq!(raw_value(&config).as_deref(), Some("{not json"));

    store.create("data:fresh");
    let decoded = decode_collection(&raw_value(&config).unwrap()).unwrap();
    assert_eq!(decoded.stories.len(), 1);
}
