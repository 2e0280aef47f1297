/// Shared types for the ephemera story workspace.
///
/// The story record and its persisted JSON form live here so the store,
/// the playback engine and the intake pipeline agree on one definition.

pub mod clock;
pub mod story;

pub use clock::{Clock, ManualClock, SystemClock};
pub use story::{
    decode_collection, encode_collection, story_ttl, Decoded, InvalidStory, Story, StoryId,
    STORY_TTL_MS, TTL_SLACK_MS,
};
