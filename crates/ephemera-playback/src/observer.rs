/// Playback event reporting.
///
/// The driver hands every effective event to an observer, which can render
/// it, log it, or discard it.

use std::fmt;

use crate::engine::PlaybackEvent;

impl fmt::Display for PlaybackEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Progress { index, fraction } => {
                write!(f, "progress idx={} fraction={:.3}", index, fraction)
            }
            Self::Advanced { from, to } => write!(f, "advanced from={} to={}", from, to),
            Self::Paused { index, fraction } => {
                write!(f, "paused idx={} fraction={:.3}", index, fraction)
            }
            Self::Resumed { index, fraction } => {
                write!(f, "resumed idx={} fraction={:.3}", index, fraction)
            }
            Self::Closed { reason } => write!(f, "closed reason={:?}", reason),
            Self::Ignored => write!(f, "ignored"),
        }
    }
}

/// Receives playback events. Implementations may draw a progress bar,
/// write to tracing, or do nothing.
pub trait PlaybackObserver: Send + Sync {
    fn on_event(&self, event: &PlaybackEvent);
}

/// Observer that uses the `tracing` crate.
pub struct TracingObserver;

impl PlaybackObserver for TracingObserver {
    fn on_event(&self, event: &PlaybackEvent) {
        // Info for session lifecycle, debug for navigation, trace for ticks
        match event {
            PlaybackEvent::Closed { .. } => tracing::info!("{}", event),
            PlaybackEvent::Progress { .. } | PlaybackEvent::Ignored => {
                tracing::trace!("{}", event)
            }
            _ => tracing::debug!("{}", event),
        }
    }
}

/// No-op observer that discards all events.
pub struct NullObserver;

impl PlaybackObserver for NullObserver {
    fn on_event(&self, _event: &PlaybackEvent) {}
}
