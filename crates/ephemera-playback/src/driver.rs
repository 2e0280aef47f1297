use chrono::{DateTime, TimeDelta, Utc};
use ephemera_types::Clock;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::engine::{CloseReason, Command, PlaybackEngine, PlaybackEvent};
use crate::observer::PlaybackObserver;
use crate::scheduler::{TickScheduler, TimerId};

/// Scheduler backed by tokio tasks.
///
/// Each armed timer is a task that sends its id down a shared channel on
/// every interval tick. Cancelling aborts the task; ids already queued are
/// dropped by the engine as stale. Must be used inside a tokio runtime.
pub struct ChannelScheduler {
    tx: mpsc::UnboundedSender<TimerId>,
    next_id: u64,
    tasks: HashMap<TimerId, JoinHandle<()>>,
}

impl ChannelScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerId>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            tx,
            next_id: 0,
            tasks: HashMap::new(),
        };
        (scheduler, rx)
    }

    /// Number of timer tasks still running.
    pub fn active(&self) -> usize {
        self.tasks.len()
    }
}

impl TickScheduler for ChannelScheduler {
    fn arm(&mut self, every: Duration) -> TimerId {
        self.next_id += 1;
        let timer = TimerId::new(self.next_id);
        let tx = self.tx.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                if tx.send(timer).is_err() {
                    break;
                }
            }
        });

        self.tasks.insert(timer, handle);
        timer
    }

    fn cancel(&mut self, timer: TimerId) {
        if let Some(handle) = self.tasks.remove(&timer) {
            handle.abort();
        }
    }
}

impl Drop for ChannelScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}

/// Wall clock that follows tokio's (pausable) time source.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    wall: DateTime<Utc>,
    origin: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            wall: Utc::now(),
            origin: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = TimeDelta::from_std(self.origin.elapsed()).unwrap_or(TimeDelta::zero());
        self.wall + elapsed
    }
}

/// Drive a playback session until it closes.
///
/// Ticks and commands are processed one at a time in arrival order. If the
/// command sender goes away the session is torn down as dismissed.
pub async fn run_session<C, O>(
    mut engine: PlaybackEngine<C, ChannelScheduler>,
    mut ticks: mpsc::UnboundedReceiver<TimerId>,
    mut commands: mpsc::Receiver<Command>,
    observer: &O,
) -> CloseReason
where
    C: Clock,
    O: PlaybackObserver + ?Sized,
{
    if let Some(reason) = engine.close_reason() {
        observer.on_event(&PlaybackEvent::Closed { reason });
        return reason;
    }

    info!("Playback started with {} stories", engine.stories().len());
    loop {
        let event = tokio::select! {
            Some(timer) = ticks.recv() => engine.on_tick(timer),
            command = commands.recv() => match command {
                Some(command) => {
                    debug!("Playback command: {:?}", command);
                    engine.handle(command)
                }
                None => engine.close(),
            },
        };

        if event != PlaybackEvent::Ignored {
            observer.on_event(&event);
        }
        if let Some(reason) = engine.close_reason() {
            return reason;
        }
    }
}
