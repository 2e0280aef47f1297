/// Ephemera playback: the auto-advancing story viewer.
///
/// - `engine`: the Advancing / Paused / Closed state machine
/// - `gesture`: tap and swipe classification for pointer input
/// - `scheduler`: tick timer abstraction with a manual test implementation
/// - `driver`: tokio-backed scheduler, clock and session loop
/// - `observer`: event sinks for rendering and logging

pub mod config;
pub mod driver;
pub mod engine;
pub mod gesture;
pub mod observer;
pub mod scheduler;

pub use config::{GestureConfig, PlaybackConfig};
pub use driver::{run_session, ChannelScheduler, TokioClock};
pub use engine::{CloseReason, Command, Key, PlaybackEngine, PlaybackEvent, PlaybackState};
pub use gesture::{Gesture, GestureTracker, Point, TapZone, Viewport};
pub use observer::{NullObserver, PlaybackObserver, TracingObserver};
pub use scheduler::{ManualScheduler, TickScheduler, TimerId};
