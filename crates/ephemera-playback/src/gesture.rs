use chrono::{DateTime, Utc};

use crate::config::GestureConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A classified pointer interaction. Drags produce no gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// Short press without movement. `at` is the release position.
    Tap { at: Point },
    SwipeLeft,
    SwipeRight,
}

/// Which half of the viewer a tap landed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapZone {
    Left,
    Right,
}

/// Horizontal extent of the viewer, in the same coordinates as [`Point`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub left: f64,
    pub width: f64,
}

impl Viewport {
    pub fn new(left: f64, width: f64) -> Self {
        Self { left, width }
    }

    /// Right of centre is [`TapZone::Right`]; the centre line itself is left.
    pub fn zone(&self, x: f64) -> TapZone {
        if x - self.left > self.width / 2.0 {
            TapZone::Right
        } else {
            TapZone::Left
        }
    }
}

/// Tracks one press/move/release interaction at a time.
#[derive(Debug, Clone)]
pub struct GestureTracker {
    config: GestureConfig,
    start: Option<(Point, DateTime<Utc>)>,
    dragging: bool,
}

impl GestureTracker {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            start: None,
            dragging: false,
        }
    }

    /// Begin an interaction, discarding any unfinished one.
    pub fn start(&mut self, at: Point, now: DateTime<Utc>) {
        self.start = Some((at, now));
        self.dragging = false;
    }

    /// Pointer moved. Once travel exceeds the drag threshold the
    /// interaction can no longer be a tap.
    pub fn moved(&mut self, to: Point) {
        let Some((origin, _)) = self.start else {
            return;
        };
        let dx = (to.x - origin.x).abs();
        let dy = (to.y - origin.y).abs();
        if dx > self.config.drag_threshold || dy > self.config.drag_threshold {
            self.dragging = true;
        }
    }

    /// Finish the interaction and classify it.
    pub fn end(&mut self, at: Point, now: DateTime<Utc>) -> Option<Gesture> {
        let (origin, started) = self.start.take()?;
        let dragging = std::mem::take(&mut self.dragging);

        let dx = at.x - origin.x;
        let dy = at.y - origin.y;
        let held_ms = (now - started).num_milliseconds();

        // Swipes are judged on net travel, independent of the drag flag.
        if dx.abs() > self.config.swipe_threshold && dx.abs() > dy.abs() {
            return Some(if dx > 0.0 {
                Gesture::SwipeRight
            } else {
                Gesture::SwipeLeft
            });
        }

        if !dragging && held_ms < self.config.tap_max_duration.as_millis() as i64 {
            return Some(Gesture::Tap { at });
        }

        None
    }

    /// Abandon the current interaction (pointer left, touch cancelled).
    pub fn cancel(&mut self) {
        self.start = None;
        self.dragging = false;
    }

    pub fn is_tracking(&self) -> bool {
        self.start.is_some()
    }
}

impl Default for GestureTracker {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn t(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_000_000 + ms).unwrap()
    }

    #[test]
    fn fast_horizontal_move_is_swipe_not_tap() {
        let mut tracker = GestureTracker::default();
        tracker.start(Point::new(200.0, 300.0), t(0));
        tracker.moved(Point::new(160.0, 302.0));
        assert_eq!(tracker.end(Point::new(120.0, 305.0), t(150)), Some(Gesture::SwipeLeft));

        tracker.start(Point::new(100.0, 300.0), t(0));
        assert_eq!(tracker.end(Point::new(180.0, 300.0), t(150)), Some(Gesture::SwipeRight));
    }

    #[test]
    fn swipe_ignores_drag_flag_and_duration() {
        let mut tracker = GestureTracker::default();
        tracker.start(Point::new(0.0, 0.0), t(0));
        tracker.moved(Point::new(-30.0, 0.0));
        assert_eq!(tracker.end(Point::new(-90.0, 10.0), t(2_000)), Some(Gesture::SwipeLeft));
    }

    #[test]
    fn stationary_press_is_tap() {
        let mut tracker = GestureTracker::default();
        tracker.start(Point::new(50.0, 50.0), t(0));
        let gesture = tracker.end(Point::new(50.0, 50.0), t(200));
        assert_eq!(gesture, Some(Gesture::Tap { at: Point::new(50.0, 50.0) }));
    }

    #[test]
    fn long_press_is_ignored() {
        let mut tracker = GestureTracker::default();
        tracker.start(Point::new(50.0, 50.0), t(0));
        assert_eq!(tracker.end(Point::new(50.0, 50.0), t(300)), None);
    }

    #[test]
    fn drag_suppresses_tap() {
        let mut tracker = GestureTracker::default();
        tracker.start(Point::new(50.0, 50.0), t(0));
        tracker.moved(Point::new(50.0, 70.0));
        // Came back to the start, but the drag flag sticks.
        assert_eq!(tracker.end(Point::new(50.0, 52.0), t(100)), None);
    }

    #[test]
    fn vertical_swipe_is_not_horizontal() {
        let mut tracker = GestureTracker::default();
        tracker.start(Point::new(0.0, 0.0), t(0));
        tracker.moved(Point::new(60.0, 100.0));
        assert_eq!(tracker.end(Point::new(60.0, 100.0), t(100)), None);
    }

    #[test]
    fn release_without_press_is_ignored() {
        let mut tracker = GestureTracker::default();
        tracker.moved(Point::new(500.0, 0.0));
        assert_eq!(tracker.end(Point::new(500.0, 0.0), t(10)), None);

        tracker.start(Point::new(0.0, 0.0), t(0));
        tracker.cancel();
        assert!(!tracker.is_tracking());
        assert_eq!(tracker.end(Point::new(0.0, 0.0), t(0) + TimeDelta::milliseconds(5)), None);
    }

    #[test]
    fn viewport_zones() {
        let viewport = Viewport::new(100.0, 400.0);
        assert_eq!(viewport.zone(301.0), TapZone::Right);
        assert_eq!(viewport.zone(300.0), TapZone::Left);
        assert_eq!(viewport.zone(120.0), TapZone::Left);
    }
}
