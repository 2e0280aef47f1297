use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Lifetime of every story: 24 hours in milliseconds.
pub const STORY_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// Slack allowed between a stored record's expiry gap and [`STORY_TTL_MS`].
/// Writers that stamp creation and expiry with separate clock reads can be
/// a few milliseconds apart.
pub const TTL_SLACK_MS: i64 = 1_000;

/// [`STORY_TTL_MS`] as a `TimeDelta`.
pub fn story_ttl() -> TimeDelta {
    TimeDelta::milliseconds(STORY_TTL_MS)
}

/// Story identifier.
///
/// Creation time in ms with a random fraction in `[0, 1)` added, so ids
/// sort by recency and two stories created in the same millisecond still
/// differ. Serialized as a bare JSON number.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryId(f64);

impl StoryId {
    /// Build an id from a creation instant and a tie-break fraction.
    /// The fraction is clamped into `[0, 1)`.
    pub fn from_parts(created_at: DateTime<Utc>, jitter: f64) -> Self {
        let jitter = if jitter.is_finite() {
            jitter.clamp(0.0, 0.999_999)
        } else {
            0.0
        };
        Self(created_at.timestamp_millis() as f64 + jitter)
    }

    /// New id for a story created at `created_at`.
    pub fn generate(created_at: DateTime<Utc>) -> Self {
        Self::from_parts(created_at, rand::random::<f64>())
    }

    pub fn from_raw(raw: f64) -> Self {
        Self(raw)
    }

    pub fn as_f64(self) -> f64 {
        self.0
    }
}

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single ephemeral story.
///
/// Field names on the wire follow the persisted layout:
/// `{ "id", "image", "timestamp", "expiresAt" }` with ms epoch numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: StoryId,
    /// Encoded image as a data URI. Opaque to everything but the renderer.
    pub image: String,
    #[serde(rename = "timestamp", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "expiresAt", with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,
}

/// Reasons a persisted record is rejected on load.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidStory {
    #[error("record does not match the story shape: {0}")]
    Shape(String),
    #[error("story id {0} is not a finite number")]
    NonFiniteId(f64),
    #[error("story {0} has an empty image payload")]
    EmptyImage(StoryId),
    #[error("story {id} expiry is {actual_ms} ms after creation, expected 24h")]
    TtlMismatch { id: StoryId, actual_ms: i64 },
}

impl Story {
    /// Create a story at `now`. Expiry is fixed here and never recomputed.
    pub fn new(id: StoryId, image: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            image: image.into(),
            created_at: now,
            expires_at: now + story_ttl(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Time left before expiry, zero once expired.
    pub fn remaining(&self, now: DateTime<Utc>) -> TimeDelta {
        (self.expires_at - now).max(TimeDelta::zero())
    }

    /// Short label for the story bar: whole hours left, or `<1h`.
    pub fn remaining_label(&self, now: DateTime<Utc>) -> String {
        let hours = self.remaining(now).num_hours();
        if hours > 0 {
            format!("{}h", hours)
        } else {
            "<1h".to_string()
        }
    }

    pub fn validate(&self) -> Result<(), InvalidStory> {
        if !self.id.as_f64().is_finite() {
            return Err(InvalidStory::NonFiniteId(self.id.as_f64()));
        }
        if self.image.is_empty() {
            return Err(InvalidStory::EmptyImage(self.id));
        }
        let actual_ms = (self.expires_at - self.created_at).num_milliseconds();
        if (actual_ms - STORY_TTL_MS).abs() > TTL_SLACK_MS {
            return Err(InvalidStory::TtlMismatch {
                id: self.id,
                actual_ms,
            });
        }
        Ok(())
    }
}

/// Result of decoding a persisted collection.
#[derive(Debug, Default)]
pub struct Decoded {
    /// Valid records, in persisted (newest-first) order.
    pub stories: Vec<Story>,
    /// Elements that failed validation and were dropped.
    pub rejected: Vec<InvalidStory>,
}

/// Decode the persisted JSON array, dropping any element that does not
/// validate. Fails only when the blob is not a JSON array at all.
pub fn decode_collection(raw: &str) -> Result<Decoded, serde_json::Error> {
    let elements: Vec<serde_json::Value> = serde_json::from_str(raw)?;
    let mut decoded = Decoded::default();

    for element in elements {
        let story = match serde_json::from_value::<Story>(element) {
            Ok(story) => story,
            Err(e) => {
                decoded.rejected.push(InvalidStory::Shape(e.to_string()));
                continue;
            }
        };
        match story.validate() {
            Ok(()) => decoded.stories.push(story),
            Err(e) => decoded.rejected.push(e),
        }
    }

    Ok(decoded)
}

pub fn encode_collection(stories: &[Story]) -> serde_json::Result<String> {
    serde_json::to_string(stories)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap()
    }

    #[test]
    fn new_story_expires_after_ttl() {
        let now = at(1_700_000_000_000);
        let story = Story::new(StoryId::from_parts(now, 0.5), "data:image/png;base64,AA", now);
        assert_eq!((story.expires_at - story.created_at).num_milliseconds(), STORY_TTL_MS);
        assert!(!story.is_expired(now));
        assert!(story.is_expired(now + story_ttl()));
        assert!(story.validate().is_ok());
    }

    #[test]
    fn wire_format_uses_persisted_names() {
        let now = at(1_000);
        let story = Story::new(StoryId::from_raw(1000.25), "data:x", now);
        let json = serde_json::to_value(&story).unwrap();
        assert_eq!(json["id"], 1000.25);
        assert_eq!(json["timestamp"], 1_000);
        assert_eq!(json["expiresAt"], 1_000 + STORY_TTL_MS);
        assert_eq!(json["image"], "data:x");
    }

    #[test]
    fn decode_drops_malformed_elements() {
        let good = format!(
            r#"{{"id": 5.5, "image": "data:a", "timestamp": 0, "expiresAt": {}}}"#,
            STORY_TTL_MS
        );
        let raw = format!(
            r#"[{good}, {{"id": "nope"}}, 17, {{"id": 1, "image": "", "timestamp": 0, "expiresAt": {ttl}}}, {{"id": 2, "image": "data:b", "timestamp": 0, "expiresAt": 5}}]"#,
            ttl = STORY_TTL_MS
        );

        let decoded = decode_collection(&raw).unwrap();
        assert_eq!(decoded.stories.len(), 1);
        assert_eq!(decoded.stories[0].id, StoryId::from_raw(5.5));
        assert_eq!(decoded.rejected.len(), 4);
        assert!(matches!(decoded.rejected[2], InvalidStory::EmptyImage(_)));
        assert!(matches!(
            decoded.rejected[3],
            InvalidStory::TtlMismatch { actual_ms: 5, .. }
        ));
    }

    #[test]
    fn expiry_within_slack_is_accepted() {
        let record = |gap: i64| {
            format!(
                r#"[{{"id": 1.5, "image": "data:a", "timestamp": 0, "expiresAt": {}}}]"#,
                gap
            )
        };

        // Separate clock reads for timestamp and expiresAt.
        let decoded = decode_collection(&record(STORY_TTL_MS + 1)).unwrap();
        assert_eq!(decoded.stories.len(), 1);
        assert_eq!(decoded.stories[0].expires_at, at(STORY_TTL_MS + 1));
        let decoded = decode_collection(&record(STORY_TTL_MS + TTL_SLACK_MS)).unwrap();
        assert_eq!(decoded.stories.len(), 1);

        let decoded = decode_collection(&record(STORY_TTL_MS + TTL_SLACK_MS + 1)).unwrap();
        assert!(decoded.stories.is_empty());
        assert!(matches!(decoded.rejected[0], InvalidStory::TtlMismatch { .. }));
    }

    #[test]
    fn decode_rejects_non_array() {
        assert!(decode_collection("{not json").is_err());
        assert!(decode_collection(r#"{"id": 1}"#).is_err());
    }

    #[test]
    fn remaining_label_rounds_down_to_hours() {
        let now = at(0);
        let story = Story::new(StoryId::from_raw(0.1), "data:a", now);
        assert_eq!(story.remaining_label(now), "24h");
        assert_eq!(story.remaining_label(now + TimeDelta::minutes(23 * 60 + 1)), "<1h");
        assert_eq!(story.remaining_label(now + TimeDelta::hours(30)), "<1h");
        assert_eq!(story.remaining(now + TimeDelta::hours(30)), TimeDelta::zero());
    }

    #[test]
    fn id_jitter_is_clamped() {
        let now = at(10);
        assert_eq!(StoryId::from_parts(now, f64::NAN).as_f64(), 10.0);
        assert!(StoryId::from_parts(now, 7.0).as_f64() < 11.0);
        let id = StoryId::generate(now).as_f64();
        assert!((10.0..11.0).contains(&id));
    }
}
