/// Timed slideshow over a fixed story snapshot.
///
/// ```text
///            pause()              tick past duration on last story,
///   Advancing ───────▶ Paused     next() on last story, close()
///       ▲   ◀───────              ─────────────────────────────▶ Closed
///       │    resume()
///       └── tick past duration / next() / previous(): index changes,
///           progress resets, timer re-armed
/// ```
///
/// Progress is accumulated from clock samples taken on each tick of the
/// armed timer, so time spent paused never counts.

use chrono::{DateTime, Utc};
use ephemera_types::{Clock, Story};
use tracing::debug;

use crate::config::PlaybackConfig;
use crate::gesture::{Gesture, TapZone, Viewport};
use crate::scheduler::{TickScheduler, TimerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// There was nothing to play.
    Empty,
    /// Played past the last story.
    Exhausted,
    /// Closed explicitly.
    Dismissed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Advancing,
    Paused,
    Closed(CloseReason),
}

/// What a single input did to the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackEvent {
    Progress { index: usize, fraction: f64 },
    Advanced { from: usize, to: usize },
    Paused { index: usize, fraction: f64 },
    Resumed { index: usize, fraction: f64 },
    Closed { reason: CloseReason },
    /// The input had no effect (stale tick, no-op navigation, input after close).
    Ignored,
}

/// Keys the viewer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Space,
    Escape,
}

/// External inputs to a playback session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Next,
    Previous,
    Pause,
    Resume,
    Close,
    Gesture(Gesture, Viewport),
}

impl Command {
    pub fn from_key(key: Key) -> Self {
        match key {
            Key::ArrowLeft => Command::Previous,
            Key::ArrowRight | Key::Space => Command::Next,
            Key::Escape => Command::Close,
        }
    }
}

pub struct PlaybackEngine<C: Clock, S: TickScheduler> {
    stories: Vec<Story>,
    index: usize,
    elapsed_ms: u64,
    last_sample: Option<DateTime<Utc>>,
    state: PlaybackState,
    timer: Option<TimerId>,
    config: PlaybackConfig,
    clock: C,
    scheduler: S,
}

impl<C: Clock, S: TickScheduler> PlaybackEngine<C, S> {
    /// Open a session at `initial_index`. An empty snapshot or an index
    /// past the end closes immediately with [`CloseReason::Empty`].
    pub fn new(
        stories: Vec<Story>,
        initial_index: usize,
        config: PlaybackConfig,
        clock: C,
        scheduler: S,
    ) -> Self {
        let mut engine = Self {
            stories,
            index: initial_index,
            elapsed_ms: 0,
            last_sample: None,
            state: PlaybackState::Advancing,
            timer: None,
            config,
            clock,
            scheduler,
        };

        if engine.index >= engine.stories.len() {
            debug!(
                "Nothing to play (index {} of {} stories)",
                initial_index,
                engine.stories.len()
            );
            engine.state = PlaybackState::Closed(CloseReason::Empty);
        } else {
            engine.arm();
        }
        engine
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, PlaybackState::Closed(_))
    }

    pub fn close_reason(&self) -> Option<CloseReason> {
        match self.state {
            PlaybackState::Closed(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    /// Story on screen, `None` once closed.
    pub fn current_story(&self) -> Option<&Story> {
        if self.is_closed() {
            None
        } else {
            self.stories.get(self.index)
        }
    }

    pub fn stories(&self) -> &[Story] {
        &self.stories
    }

    /// Fraction of the current story shown, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        let duration = self.config.story_duration.as_millis() as u64;
        if duration == 0 {
            return 1.0;
        }
        (self.elapsed_ms as f64 / duration as f64).min(1.0)
    }

    /// Fill of the progress segment for story `index`.
    pub fn segment_fill(&self, index: usize) -> f64 {
        if index < self.index {
            1.0
        } else if index == self.index {
            self.progress()
        } else {
            0.0
        }
    }

    /// `"2 / 5"` style position counter.
    pub fn position_label(&self) -> String {
        let shown = if self.stories.is_empty() { 0 } else { self.index + 1 };
        format!("{} / {}", shown, self.stories.len())
    }

    /// Timer the engine currently expects ticks from.
    pub fn timer(&self) -> Option<TimerId> {
        self.timer
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn handle(&mut self, command: Command) -> PlaybackEvent {
        match command {
            Command::Next => self.next(),
            Command::Previous => self.previous(),
            Command::Pause => self.pause(),
            Command::Resume => self.resume(),
            Command::Close => self.close(),
            Command::Gesture(gesture, viewport) => self.handle_gesture(gesture, viewport),
        }
    }

    /// Swipe left or tap right goes forward, swipe right or tap left goes back.
    pub fn handle_gesture(&mut self, gesture: Gesture, viewport: Viewport) -> PlaybackEvent {
        match gesture {
            Gesture::SwipeLeft => self.next(),
            Gesture::SwipeRight => self.previous(),
            Gesture::Tap { at } => match viewport.zone(at.x) {
                TapZone::Right => self.next(),
                TapZone::Left => self.previous(),
            },
        }
    }

    /// Process a tick from `timer`. Ticks from any timer other than the
    /// one currently armed are stale and ignored.
    pub fn on_tick(&mut self, timer: TimerId) -> PlaybackEvent {
        if self.state != PlaybackState::Advancing || self.timer != Some(timer) {
            return PlaybackEvent::Ignored;
        }

        self.sample();
        if self.elapsed_ms >= self.config.story_duration.as_millis() as u64 {
            return self.next();
        }

        PlaybackEvent::Progress {
            index: self.index,
            fraction: self.progress(),
        }
    }

    pub fn next(&mut self) -> PlaybackEvent {
        if self.is_closed() {
            return PlaybackEvent::Ignored;
        }
        if self.index + 1 < self.stories.len() {
            self.go_to(self.index + 1)
        } else {
            self.close_with(CloseReason::Exhausted)
        }
    }

    /// Step back one story. A no-op on the first story.
    pub fn previous(&mut self) -> PlaybackEvent {
        if self.is_closed() || self.index == 0 {
            return PlaybackEvent::Ignored;
        }
        self.go_to(self.index - 1)
    }

    pub fn pause(&mut self) -> PlaybackEvent {
        if self.state != PlaybackState::Advancing {
            return PlaybackEvent::Ignored;
        }
        self.sample();
        self.disarm();
        self.state = PlaybackState::Paused;
        PlaybackEvent::Paused {
            index: self.index,
            fraction: self.progress(),
        }
    }

    pub fn resume(&mut self) -> PlaybackEvent {
        if self.state != PlaybackState::Paused {
            return PlaybackEvent::Ignored;
        }
        self.state = PlaybackState::Advancing;
        self.arm();
        PlaybackEvent::Resumed {
            index: self.index,
            fraction: self.progress(),
        }
    }

    pub fn close(&mut self) -> PlaybackEvent {
        if self.is_closed() {
            return PlaybackEvent::Ignored;
        }
        self.close_with(CloseReason::Dismissed)
    }

    fn go_to(&mut self, to: usize) -> PlaybackEvent {
        let from = self.index;
        self.index = to;
        self.elapsed_ms = 0;
        if self.state == PlaybackState::Advancing {
            self.arm();
        }
        debug!("Story {} -> {} of {}", from, to, self.stories.len());
        PlaybackEvent::Advanced { from, to }
    }

    fn close_with(&mut self, reason: CloseReason) -> PlaybackEvent {
        self.disarm();
        self.state = PlaybackState::Closed(reason);
        debug!("Playback closed at story {}: {:?}", self.index, reason);
        PlaybackEvent::Closed { reason }
    }

    /// Replace any running timer with a fresh one and restart sampling.
    fn arm(&mut self) {
        self.disarm();
        self.timer = Some(self.scheduler.arm(self.config.tick_interval));
        self.last_sample = Some(self.clock.now());
    }

    fn disarm(&mut self) {
        if let Some(timer) = self.timer.take() {
            self.scheduler.cancel(timer);
        }
        self.last_sample = None;
    }

    fn sample(&mut self) {
        let Some(last) = self.last_sample else {
            return;
        };
        let now = self.clock.now();
        let delta = (now - last).num_milliseconds().max(0) as u64;
        self.elapsed_ms = self.elapsed_ms.saturating_add(delta);
        self.last_sample = Some(now);
    }
}

impl<C: Clock, S: TickScheduler> Drop for PlaybackEngine<C, S> {
    fn drop(&mut self) {
        self.disarm();
    }
}
