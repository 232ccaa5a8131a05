//! Horizontal swipe detection.

use super::Direction;

/// Minimum horizontal travel, in device-independent pixels, that counts as
/// a swipe. The comparison is strict.
pub const SWIPE_THRESHOLD: f64 = 50.0;

/// Classify a drag from `start_x` to `end_x`. Dragging left moves forward,
/// dragging right moves backward.
pub fn classify_swipe(start_x: f64, end_x: f64) -> Option<Direction> {
    let diff = start_x - end_x;
    if diff.abs() > SWIPE_THRESHOLD {
        if diff > 0.0 {
            Some(Direction::Forward)
        } else {
            Some(Direction::Backward)
        }
    } else {
        None
    }
}

/// Tracks one touch/drag gesture from press to release
#[derive(Debug, Default, Clone, Copy)]
pub struct SwipeTracker {
    start_x: Option<f64>,
}

impl SwipeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, x: f64) {
        self.start_x = Some(x);
    }

    /// Finish the gesture. A release without a press is ignored.
    pub fn end(&mut self, x: f64) -> Option<Direction> {
        let start = self.start_x.take()?;
        classify_swipe(start, x)
    }

    pub fn is_tracking(&self) -> bool {
        self.start_x.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_left_drag_past_threshold_moves_forward() {
        assert_eq!(classify_swipe(200.0, 149.0), Some(Direction::Forward));
    }

    #[test]
    fn test_right_drag_past_threshold_moves_backward() {
        assert_eq!(classify_swipe(100.0, 151.0), Some(Direction::Backward));
    }

    #[test]
    fn test_threshold_is_strict() {
        assert_eq!(classify_swipe(200.0, 151.0), None);
        assert_eq!(classify_swipe(200.0, 150.0), None);
        assert_eq!(classify_swipe(100.0, 150.0), None);
        assert_eq!(classify_swipe(100.0, 100.0), None);
    }

    #[test]
    fn test_tracker() {
        let mut tracker = SwipeTracker::new();
        assert_eq!(tracker.end(0.0), None);

        tracker.start(300.0);
        assert!(tracker.is_tracking());
        assert_eq!(tracker.end(100.0), Some(Direction::Forward));
        assert!(!tracker.is_tracking());

        // Release consumed the gesture
        assert_eq!(tracker.end(100.0), None);
    }
}
