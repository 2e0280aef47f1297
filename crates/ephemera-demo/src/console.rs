use ephemera_playback::{Command, Key, PlaybackEvent, PlaybackObserver, TracingObserver};

const BAR_WIDTH: usize = 20;

/// Map a line typed on stdin to a viewer command.
pub fn parse_input(line: &str) -> Option<Command> {
    match line.trim().to_ascii_lowercase().as_str() {
        "n" | "next" | "right" => Some(Command::from_key(Key::ArrowRight)),
        "" | "space" => Some(Command::from_key(Key::Space)),
        "p" | "prev" | "left" => Some(Command::from_key(Key::ArrowLeft)),
        "q" | "quit" | "esc" => Some(Command::from_key(Key::Escape)),
        "pause" | "hold" => Some(Command::Pause),
        "resume" | "release" => Some(Command::Resume),
        _ => None,
    }
}

/// Prints a text progress bar for each story and logs all events.
pub struct ConsoleObserver {
    pub total: usize,
}

impl ConsoleObserver {
    fn bar(fraction: f64) -> String {
        let filled = ((fraction.clamp(0.0, 1.0)) * BAR_WIDTH as f64).round() as usize;
        format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
    }
}

impl PlaybackObserver for ConsoleObserver {
    fn on_event(&self, event: &PlaybackEvent) {
        TracingObserver.on_event(event);
        match *event {
            // Every fifth of a story is plenty for a terminal
            PlaybackEvent::Progress { index, fraction } => {
                let step = (fraction * 100.0).round() as u64;
                if step % 20 == 0 {
                    println!("{} {} / {}", Self::bar(fraction), index + 1, self.total);
                }
            }
            PlaybackEvent::Advanced { to, .. } => {
                println!("{} {} / {}", Self::bar(0.0), to + 1, self.total);
            }
            PlaybackEvent::Paused { index, fraction } => {
                println!("{} {} / {} (paused)", Self::bar(fraction), index + 1, self.total);
            }
            PlaybackEvent::Resumed { .. } | PlaybackEvent::Ignored => {}
            PlaybackEvent::Closed { reason } => println!("viewer closed ({:?})", reason),
        }
    }
}
