//! Per-section scroll distance tracker

/// Accumulates unsigned scroll distance and fires once per threshold crossing
#[derive(Debug, Clone)]
pub struct ScrollTracker {
    delta_px: f64,
    threshold_px: f64,
}

impl ScrollTracker {
    pub fn new(threshold_px: f64) -> Self {
        Self {
            delta_px: 0.0,
            threshold_px,
        }
    }

    /// Distance accumulated since the last reset
    pub fn delta_px(&self) -> f64 {
        self.delta_px
    }

    pub fn threshold_px(&self) -> f64 {
        self.threshold_px
    }

    /// Add a scroll delta in either direction.
    ///
    /// Returns `true` exactly when this delta brings the total to the threshold.
    /// Further deltas keep accumulating but do not fire again until [`reset`].
    ///
    /// [`reset`]: ScrollTracker::reset
    pub fn add_delta(&mut self, px: f64) -> bool {
        if !px.is_finite() {
            return false;
        }

        let below = self.delta_px < self.threshold_px;
        self.delta_px += px.abs();
        below && self.delta_px >= self.threshold_px
    }

    pub fn reset(&mut self) {
        self.delta_px = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_threshold_deltas_accumulate() {
        let mut tracker = ScrollTracker::new(100.0);

        assert!(!tracker.add_delta(60.0));
        assert!(tracker.add_delta(60.0));
        assert_eq!(tracker.delta_px(), 120.0);
    }

    #[test]
    fn test_fires_once_per_crossing() {
        let mut tracker = ScrollTracker::new(100.0);

        let fired: Vec<bool> = [40.0, 40.0, 40.0].iter().map(|&px| tracker.add_delta(px)).collect();
        assert_eq!(fired, vec![false, false, true]);

        assert!(!tracker.add_delta(500.0));

        // A new crossing needs a reset and another full threshold of movement
        tracker.reset();
        assert!(!tracker.add_delta(99.0));
        assert!(tracker.add_delta(1.0));
    }

    #[test]
    fn test_direction_is_ignored() {
        let mut tracker = ScrollTracker::new(100.0);

        assert!(!tracker.add_delta(-50.0));
        assert_eq!(tracker.delta_px(), 50.0);
        assert!(tracker.add_delta(50.0));
    }

    #[test]
    fn test_non_finite_deltas_are_dropped() {
        let mut tracker = ScrollTracker::new(100.0);

        assert!(!tracker.add_delta(f64::NAN));
        assert!(!tracker.add_delta(f64::INFINITY));
        assert_eq!(tracker.delta_px(), 0.0);
    }

    #[test]
    fn test_reset_clears_progress() {
        let mut tracker = ScrollTracker::new(100.0);
        tracker.add_delta(90.0);
        tracker.reset();

        assert!(!tracker.add_delta(20.0));
    }
}
