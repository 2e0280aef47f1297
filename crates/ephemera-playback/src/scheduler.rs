use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Handle to one armed repeating timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

impl TimerId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Arms and cancels repeating tick timers for the playback engine.
///
/// The scheduler only delivers `TimerId`s; whoever owns the engine feeds
/// them back through [`crate::PlaybackEngine::on_tick`].
pub trait TickScheduler {
    fn arm(&mut self, interval: Duration) -> TimerId;

    /// Cancel a timer. Cancelling an unknown or already cancelled timer is
    /// a no-op.
    fn cancel(&mut self, timer: TimerId);
}

/// Scheduler that only records what is armed. Tests fire ticks by hand.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    armed: BTreeMap<TimerId, Duration>,
    arms: usize,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timers currently armed, oldest first.
    pub fn armed(&self) -> Vec<TimerId> {
        self.armed.keys().copied().collect()
    }

    pub fn interval(&self, timer: TimerId) -> Option<Duration> {
        self.armed.get(&timer).copied()
    }

    /// Total number of `arm` calls over the scheduler's life.
    pub fn arm_count(&self) -> usize {
        self.arms
    }
}

impl TickScheduler for ManualScheduler {
    fn arm(&mut self, interval: Duration) -> TimerId {
        self.next_id += 1;
        self.arms += 1;
        let timer = TimerId(self.next_id);
        self.armed.insert(timer, interval);
        timer
    }

    fn cancel(&mut self, timer: TimerId) {
        self.armed.remove(&timer);
    }
}
