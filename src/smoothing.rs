// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Moving-average smoothing of posture metrics.

use std::collections::VecDeque;

use crate::metrics::PostureMetrics;

/// Fixed-capacity, equal-weight moving average.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl MovingAverage {
    /// Create a window holding at most `capacity` samples (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Add a sample, evicting the oldest one once the window is full, and return
    /// the new mean.
    pub fn push(&mut self, sample: f32) -> f32 {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
        self.mean()
    }

    /// Mean of the current window, `0.0` when empty.
    #[must_use]
    pub fn mean(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let len = self.samples.len() as f32;
        self.samples.iter().sum::<f32>() / len
    }

    /// Number of samples currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no sample has been pushed since creation or the last clear.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of samples held.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all samples.
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Smoothed metric values handed to the evaluator.
///
/// Distance and angle are window means; shoulder visibilities are taken from the
/// latest frame as-is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedMetrics {
    /// Mean relative distance.
    pub distance: f32,
    /// Mean tilt angle in degrees.
    pub angle: f32,
    /// Latest left shoulder visibility.
    pub left_visibility: f32,
    /// Latest right shoulder visibility.
    pub right_visibility: f32,
}

impl SmoothedMetrics {
    /// Smoothed values with both shoulders fully visible.
    #[must_use]
    pub const fn new(distance: f32, angle: f32) -> Self {
        Self {
            distance,
            angle,
            left_visibility: 1.0,
            right_visibility: 1.0,
        }
    }

    /// Override the shoulder visibilities.
    #[must_use]
    pub const fn with_visibility(mut self, left: f32, right: f32) -> Self {
        self.left_visibility = left;
        self.right_visibility = right;
        self
    }
}

/// One moving average per posture signal.
#[derive(Debug, Clone)]
pub struct MetricSmoother {
    distance: MovingAverage,
    angle: MovingAverage,
    latest: Option<SmoothedMetrics>,
}

impl MetricSmoother {
    /// Create a smoother whose windows hold `window_size` samples.
    #[must_use]
    pub fn new(window_size: usize) -> Self {
        Self {
            distance: MovingAverage::new(window_size),
            angle: MovingAverage::new(window_size),
            latest: None,
        }
    }

    /// Feed one frame of metrics and return the smoothed values.
    pub fn update(&mut self, metrics: &PostureMetrics) -> SmoothedMetrics {
        let smoothed = SmoothedMetrics {
            distance: self.distance.push(metrics.relative_distance),
            angle: self.angle.push(metrics.tilt_angle),
            left_visibility: metrics.left_visibility,
            right_visibility: metrics.right_visibility,
        };
        self.latest = Some(smoothed);
        smoothed
    }

    /// Smoothed values after the last update, `None` before the first one.
    #[must_use]
    pub const fn current(&self) -> Option<SmoothedMetrics> {
        self.latest
    }

    /// Number of samples in each window.
    #[must_use]
    pub fn len(&self) -> usize {
        self.distance.len()
    }

    /// Whether no metrics have been fed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.distance.is_empty()
    }

    /// Forget all samples.
    pub fn clear(&mut self) {
        self.distance.clear();
        self.angle.clear();
        self.latest = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_averages_with_eviction() {
        let mut avg = MovingAverage::new(5);
        let means: Vec<f32> = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
            .iter()
            .map(|&s| avg.push(s))
            .collect();

        let expected = [1.0, 1.5, 2.0, 2.5, 3.0, 4.0];
        for (got, want) in means.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-6, "got {got}, want {want}");
        }
        assert_eq!(avg.len(), 5);
    }

    #[test]
    fn test_window_never_exceeds_capacity() {
        let mut avg = MovingAverage::new(3);
        for i in 0..100 {
            avg.push(i as f32);
            assert!(avg.len() <= avg.capacity());
        }
        // Last three samples: 97, 98, 99
        assert!((avg.mean() - 98.0).abs() < 1e-4);
    }

    #[test]
    fn test_empty_mean_is_zero() {
        let avg = MovingAverage::new(5);
        assert!(avg.is_empty());
        assert!(avg.mean().abs() < f32::EPSILON);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut avg = MovingAverage::new(0);
        assert_eq!(avg.capacity(), 1);
        avg.push(3.0);
        assert!((avg.push(7.0) - 7.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_metric_smoother() {
        let mut smoother = MetricSmoother::new(2);
        assert!(smoother.current().is_none());

        let frame = |d: f32, a: f32, vis: f32| PostureMetrics {
            relative_distance: d,
            tilt_angle: a,
            left_visibility: vis,
            right_visibility: 1.0,
        };

        smoother.update(&frame(0.2, 10.0, 0.9));
        let s = smoother.update(&frame(0.4, 20.0, 0.4));
        assert!((s.distance - 0.3).abs() < 1e-6);
        assert!((s.angle - 15.0).abs() < 1e-6);
        // Visibility is not averaged
        assert!((s.left_visibility - 0.4).abs() < f32::EPSILON);
        assert_eq!(smoother.current(), Some(s));

        smoother.clear();
        assert!(smoother.is_empty());
        assert!(smoother.current().is_none());
    }
}
