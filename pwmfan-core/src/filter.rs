//! Rate-limited ascent filter
//!
//! Increases are applied progressively (1, 2, 3, ... levels per tick) until
//! the target is reached; decreases are applied at once.

/// Step limiter state of one fan unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepLimiter {
    accumulator: i64,
}

impl StepLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current step size.
    pub fn accumulator(&self) -> i64 {
        self.accumulator
    }

    /// Turn a target drive level into the level to apply this tick.
    pub fn apply(&mut self, current: i64, target: i64) -> i64 {
        if target > current {
            self.accumulator += 1;
            let candidate = current + self.accumulator;
            if candidate >= target {
                self.accumulator = 0;
                target
            } else {
                candidate
            }
        } else {
            self.accumulator = 0;
            target
        }
    }

    /// Double the step size.
    ///
    /// Used when a ramp step was discarded in favour of keeping the fan
    /// stopped, so the next real ramp catches up faster.
    pub fn double(&mut self) {
        self.accumulator *= 2;
    }

    pub fn reset(&mut self) {
        self.accumulator = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accelerating_ramp_then_clamp() {
        let mut limiter = StepLimiter::new();
        let mut current = 100;
        let mut applied = Vec::new();

        while current != 130 {
            current = limiter.apply(current, 130);
            applied.push(current);
        }

        // +1, +2, ... +7, then clamped
        assert_eq!(applied, vec![101, 103, 106, 110, 115, 121, 128, 130]);
        assert_eq!(limiter.accumulator(), 0);

        // Stable at target
        assert_eq!(limiter.apply(130, 130), 130);
        assert_eq!(limiter.accumulator(), 0);
    }

    #[test]
    fn test_increments_strictly_increase() {
        let mut limiter = StepLimiter::new();
        let mut current = 0;
        let mut last_step = 0;
        loop {
            let next = limiter.apply(current, 255);
            if next == 255 {
                break;
            }
            let step = next - current;
            assert!(step > last_step);
            last_step = step;
            current = next;
        }
    }

    #[test]
    fn test_decrease_is_immediate() {
        let mut limiter = StepLimiter::new();
        assert_eq!(limiter.apply(100, 150), 101);
        assert_eq!(limiter.apply(101, 150), 103);
        assert_eq!(limiter.accumulator(), 2);

        assert_eq!(limiter.apply(103, 40), 40);
        assert_eq!(limiter.accumulator(), 0);
    }

    #[test]
    fn test_small_gap_reached_in_one_step() {
        let mut limiter = StepLimiter::new();
        assert_eq!(limiter.apply(99, 100), 100);
        assert_eq!(limiter.accumulator(), 0);
    }

    #[test]
    fn test_double() {
        let mut limiter = StepLimiter::new();
        limiter.apply(0, 100);
        limiter.apply(1, 100);
        limiter.apply(3, 100);
        assert_eq!(limiter.accumulator(), 3);
        limiter.double();
        assert_eq!(limiter.accumulator(), 6);
        assert_eq!(limiter.apply(0, 100), 7);
        limiter.reset();
        assert_eq!(limiter.accumulator(), 0);
    }
}
