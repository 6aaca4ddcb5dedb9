//! Tick-accumulating interval timer

use serde::{Deserialize, Serialize};

/// Fires once each time the accumulated time reaches the period
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    elapsed: f32,
}

impl Interval {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by `delta`; true (and reset) once `period` has elapsed
    pub fn tick(&mut self, delta: f32, period: f32) -> bool {
        self.elapsed += delta;
        if self.elapsed >= period {
            self.elapsed = 0.0;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_every_period() {
        let mut t = Interval::new();
        let fired: Vec<bool> = (0..6).map(|_| t.tick(1.0, 2.0)).collect();
        assert_eq!(fired, [false, true, false, true, false, true]);
    }

    #[test]
    fn test_zero_period_fires_each_tick() {
        let mut t = Interval::new();
        assert!(t.tick(0.5, 0.0));
        assert!(t.tick(0.5, 0.0));
    }
}
