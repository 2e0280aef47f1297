use std::time::Duration;

/// Slideshow timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackConfig {
    /// How long each story stays on screen before auto-advancing.
    pub story_duration: Duration,
    /// How often progress is sampled while advancing.
    pub tick_interval: Duration,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        PlaybackConfig {
            story_duration: Duration::from_millis(5000),
            tick_interval: Duration::from_millis(50), // 20 Hz progress bar
        }
    }
}

impl PlaybackConfig {
    /// Override the defaults with `EPHEMERA_STORY_MS` and `EPHEMERA_TICK_MS`.
    /// Zero or unparsable values are ignored.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        PlaybackConfig {
            story_duration: env_millis("EPHEMERA_STORY_MS").unwrap_or(defaults.story_duration),
            tick_interval: env_millis("EPHEMERA_TICK_MS").unwrap_or(defaults.tick_interval),
        }
    }
}

/// Thresholds for classifying pointer interactions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureConfig {
    /// Horizontal travel (px) beyond which a release counts as a swipe.
    pub swipe_threshold: f64,
    /// Travel (px) on either axis that turns a press into a drag.
    pub drag_threshold: f64,
    /// Presses held this long or longer are not taps.
    pub tap_max_duration: Duration,
}

impl Default for GestureConfig {
    fn default() -> Self {
        GestureConfig {
            swipe_threshold: 50.0,
            drag_threshold: 10.0,
            tap_max_duration: Duration::from_millis(300),
        }
    }
}

impl GestureConfig {
    /// Override the swipe threshold with `EPHEMERA_SWIPE_PX`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let swipe_threshold = std::env::var("EPHEMERA_SWIPE_PX")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|px| px.is_finite() && *px > 0.0)
            .unwrap_or(defaults.swipe_threshold);
        GestureConfig {
            swipe_threshold,
            ..defaults
        }
    }
}

fn env_millis(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}
