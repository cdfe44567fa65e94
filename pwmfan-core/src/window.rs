//! Fixed-capacity rolling window of integer samples

use std::collections::VecDeque;

/// Last `N` samples in arrival order, pre-filled with zeros.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleWindow {
    samples: VecDeque<i64>,
}

impl SampleWindow {
    /// Create a window of `capacity` zeros.
    ///
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: std::iter::repeat(0).take(capacity).collect(),
        }
    }

    /// Append a sample, dropping the oldest.
    pub fn push(&mut self, value: i64) {
        self.samples.pop_front();
        self.samples.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// `(max - min) / |min|`, or `None` when the minimum is zero.
    ///
    /// The spread is relative to the magnitude of the minimum so that
    /// negative readings still yield a non-negative range.
    pub fn range_relative(&self) -> Option<f64> {
        let min = *self.samples.iter().min()?;
        let max = *self.samples.iter().max()?;
        if min == 0 {
            return None;
        }
        Some((max - min) as f64 / min.unsigned_abs() as f64)
    }

    /// Whether the relative spread is below `precision`.
    ///
    /// A window whose minimum is zero (including one not yet filled) never
    /// counts as settled.
    pub fn is_settled(&self, precision: f64) -> bool {
        self.range_relative().is_some_and(|range| range < precision)
    }

    /// Truncating integer mean.
    pub fn mean(&self) -> i64 {
        let sum: i64 = self.samples.iter().sum();
        sum / self.samples.len() as i64
    }

    /// Most recent sample.
    pub fn last(&self) -> i64 {
        self.samples.back().copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_is_constant() {
        let mut window = SampleWindow::new(5);
        assert_eq!(window.len(), 5);
        for i in 0..12 {
            window.push(i);
            assert_eq!(window.len(), 5);
        }
        assert_eq!(window.last(), 11);
    }

    #[test]
    fn test_mean_constant() {
        let mut window = SampleWindow::new(5);
        for _ in 0..5 {
            window.push(5);
        }
        assert_eq!(window.mean(), 5);
    }

    #[test]
    fn test_mean_truncates_and_counts_prefill() {
        let mut window = SampleWindow::new(4);
        window.push(7);
        // (0 + 0 + 0 + 7) / 4
        assert_eq!(window.mean(), 1);
        window.push(8);
        window.push(8);
        window.push(8);
        // 31 / 4
        assert_eq!(window.mean(), 7);
    }

    #[test]
    fn test_range_relative_flat() {
        let mut window = SampleWindow::new(3);
        for _ in 0..3 {
            window.push(100);
        }
        assert_eq!(window.range_relative(), Some(0.0));
        assert!(window.is_settled(0.015));
    }

    #[test]
    fn test_range_relative_spread() {
        let mut window = SampleWindow::new(3);
        window.push(100);
        window.push(110);
        window.push(105);
        let range = window.range_relative().unwrap();
        assert!((range - 0.1).abs() < 1e-12);
        assert!(!window.is_settled(0.015));
        assert!(window.is_settled(0.2));
    }

    #[test]
    fn test_range_relative_negative_readings() {
        let mut window = SampleWindow::new(3);
        window.push(-5000);
        window.push(-4900);
        window.push(-5000);
        let range = window.range_relative().unwrap();
        assert!((range - 0.02).abs() < 1e-12);
        assert!(!window.is_settled(0.015));
        assert!(window.is_settled(0.05));
    }

    #[test]
    fn test_zero_minimum_guarded() {
        let mut window = SampleWindow::new(3);
        assert_eq!(window.range_relative(), None);
        window.push(100);
        window.push(100);
        // One pre-filled zero remains
        assert_eq!(window.range_relative(), None);
        assert!(!window.is_settled(1.0));
        window.push(100);
        assert!(window.is_settled(0.015));
    }

    #[test]
    fn test_zero_capacity_raised() {
        let window = SampleWindow::new(0);
        assert_eq!(window.len(), 1);
        assert_eq!(window.mean(), 0);
    }
}
