// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Monitor configuration.
//!
//! This module defines the [`MonitorConfig`] struct, which holds every tunable of the
//! monitor: detector settings, smoothing, posture thresholds, calibration tolerances
//! and alert behavior.

use std::path::PathBuf;
use std::time::Duration;

use crate::download::DEFAULT_POSE_MODEL;
use crate::error::{MonitorError, Result};

/// Default minimum relative ear-to-shoulder distance before posture is flagged.
pub const DEFAULT_MIN_RELATIVE_DISTANCE: f32 = 0.15;
/// Default maximum torso tilt angle in degrees.
pub const DEFAULT_MAX_TILT_ANGLE: f32 = 15.0;
/// Default number of samples in each smoothing window.
pub const DEFAULT_WINDOW_SIZE: usize = 5;
/// Default minimum shoulder visibility.
pub const DEFAULT_VISIBILITY_THRESHOLD: f32 = 0.5;
/// Default allowed distance deviation from the reference posture.
pub const DEFAULT_DISTANCE_TOLERANCE: f32 = 0.08;
/// Default allowed angle deviation from the reference posture, in degrees.
pub const DEFAULT_ANGLE_TOLERANCE: f32 = 5.0;
/// Default time between two audible alerts.
pub const DEFAULT_ALERT_COOLDOWN: Duration = Duration::from_secs(5);
/// Default alert sound file.
pub const DEFAULT_ALERT_SOUND: &str = "alert.wav";

/// Configuration for a monitoring session.
///
/// Uses a builder pattern for convenient construction.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use posture_monitor::MonitorConfig;
///
/// let config = MonitorConfig::new()
///     .with_window_size(8)
///     .with_max_tilt_angle(12.0)
///     .with_alert_cooldown(Duration::from_secs(10));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Path to the ONNX pose model.
    pub model_path: PathBuf,
    /// Minimum person score for a pose to count as detected (0.0 to 1.0).
    pub detection_confidence: f32,
    /// Inference input size (height, width).
    pub imgsz: (u32, u32),
    /// Number of intra-op threads for ONNX Runtime, `0` lets the runtime decide.
    pub num_threads: usize,
    /// Flip frames horizontally before detection and display.
    pub mirror: bool,
    /// Samples per smoothing window.
    pub window_size: usize,
    /// Shoulder visibility below this value raises an alert.
    pub visibility_threshold: f32,
    /// Fixed-threshold mode: minimum relative ear-to-shoulder distance.
    pub min_relative_distance: f32,
    /// Fixed-threshold mode: maximum torso tilt in degrees.
    pub max_tilt_angle: f32,
    /// Calibrated mode: allowed |distance - reference distance|.
    pub distance_tolerance: f32,
    /// Calibrated mode: allowed |angle - reference angle| in degrees.
    pub angle_tolerance: f32,
    /// Minimum time between two audible alerts.
    pub alert_cooldown: Duration,
    /// Alert sound file.
    pub alert_sound: PathBuf,
    /// Consecutive failed frame reads tolerated before giving up.
    pub max_capture_failures: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_POSE_MODEL),
            detection_confidence: 0.7,
            imgsz: (640, 640),
            num_threads: 0,
            mirror: true,
            window_size: DEFAULT_WINDOW_SIZE,
            visibility_threshold: DEFAULT_VISIBILITY_THRESHOLD,
            min_relative_distance: DEFAULT_MIN_RELATIVE_DISTANCE,
            max_tilt_angle: DEFAULT_MAX_TILT_ANGLE,
            distance_tolerance: DEFAULT_DISTANCE_TOLERANCE,
            angle_tolerance: DEFAULT_ANGLE_TOLERANCE,
            alert_cooldown: DEFAULT_ALERT_COOLDOWN,
            alert_sound: PathBuf::from(DEFAULT_ALERT_SOUND),
            max_capture_failures: 30,
        }
    }
}

impl MonitorConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pose model path.
    #[must_use]
    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    /// Set the minimum detection confidence for a pose.
    #[must_use]
    pub const fn with_detection_confidence(mut self, confidence: f32) -> Self {
        self.detection_confidence = confidence;
        self
    }

    /// Set the inference input size.
    #[must_use]
    pub const fn with_imgsz(mut self, height: u32, width: u32) -> Self {
        self.imgsz = (height, width);
        self
    }

    /// Set the number of ONNX Runtime intra-op threads.
    #[must_use]
    pub const fn with_threads(mut self, threads: usize) -> Self {
        self.num_threads = threads;
        self
    }

    /// Enable or disable horizontal mirroring of frames.
    #[must_use]
    pub const fn with_mirror(mut self, mirror: bool) -> Self {
        self.mirror = mirror;
        self
    }

    /// Set the smoothing window size.
    #[must_use]
    pub const fn with_window_size(mut self, size: usize) -> Self {
        self.window_size = size;
        self
    }

    /// Set the shoulder visibility threshold.
    #[must_use]
    pub const fn with_visibility_threshold(mut self, threshold: f32) -> Self {
        self.visibility_threshold = threshold;
        self
    }

    /// Set the minimum relative distance used without a reference posture.
    #[must_use]
    pub const fn with_min_relative_distance(mut self, distance: f32) -> Self {
        self.min_relative_distance = distance;
        self
    }

    /// Set the maximum tilt angle used without a reference posture.
    #[must_use]
    pub const fn with_max_tilt_angle(mut self, degrees: f32) -> Self {
        self.max_tilt_angle = degrees;
        self
    }

    /// Set both calibration tolerances.
    #[must_use]
    pub const fn with_tolerances(mut self, distance: f32, angle: f32) -> Self {
        self.distance_tolerance = distance;
        self.angle_tolerance = angle;
        self
    }

    /// Set the minimum time between two audible alerts.
    #[must_use]
    pub const fn with_alert_cooldown(mut self, cooldown: Duration) -> Self {
        self.alert_cooldown = cooldown;
        self
    }

    /// Set the alert sound file.
    #[must_use]
    pub fn with_alert_sound(mut self, path: impl Into<PathBuf>) -> Self {
        self.alert_sound = path.into();
        self
    }

    /// Set how many consecutive failed frame reads are tolerated.
    #[must_use]
    pub const fn with_max_capture_failures(mut self, failures: usize) -> Self {
        self.max_capture_failures = failures;
        self
    }

    /// Check that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::ConfigError`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(MonitorError::ConfigError(
                "window_size must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.detection_confidence) {
            return Err(MonitorError::ConfigError(format!(
                "detection_confidence must be within [0, 1], got {}",
                self.detection_confidence
            )));
        }
        if !(0.0..=1.0).contains(&self.visibility_threshold) {
            return Err(MonitorError::ConfigError(format!(
                "visibility_threshold must be within [0, 1], got {}",
                self.visibility_threshold
            )));
        }
        if !(0.0..=180.0).contains(&self.max_tilt_angle) {
            return Err(MonitorError::ConfigError(format!(
                "max_tilt_angle must be within [0, 180], got {}",
                self.max_tilt_angle
            )));
        }
        if self.min_relative_distance < 0.0 {
            return Err(MonitorError::ConfigError(format!(
                "min_relative_distance must not be negative, got {}",
                self.min_relative_distance
            )));
        }
        if self.distance_tolerance < 0.0 || self.angle_tolerance < 0.0 {
            return Err(MonitorError::ConfigError(format!(
                "tolerances must not be negative, got distance={} angle={}",
                self.distance_tolerance, self.angle_tolerance
            )));
        }
        if self.imgsz.0 == 0 || self.imgsz.1 == 0 {
            return Err(MonitorError::ConfigError(
                "imgsz must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = MonitorConfig::default();
        assert!((config.min_relative_distance - 0.15).abs() < f32::EPSILON);
        assert!((config.max_tilt_angle - 15.0).abs() < f32::EPSILON);
        assert!((config.visibility_threshold - 0.5).abs() < f32::EPSILON);
        assert!((config.distance_tolerance - 0.08).abs() < f32::EPSILON);
        assert!((config.angle_tolerance - 5.0).abs() < f32::EPSILON);
        assert_eq!(config.window_size, 5);
        assert_eq!(config.alert_cooldown, Duration::from_secs(5));
        assert_eq!(config.alert_sound, PathBuf::from("alert.wav"));
        assert!(config.mirror);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = MonitorConfig::new()
            .with_window_size(10)
            .with_tolerances(0.1, 7.5)
            .with_max_tilt_angle(20.0)
            .with_mirror(false)
            .with_imgsz(320, 320)
            .with_alert_sound("ding.ogg");

        assert_eq!(config.window_size, 10);
        assert!((config.distance_tolerance - 0.1).abs() < f32::EPSILON);
        assert!((config.angle_tolerance - 7.5).abs() < f32::EPSILON);
        assert!((config.max_tilt_angle - 20.0).abs() < f32::EPSILON);
        assert!(!config.mirror);
        assert_eq!(config.imgsz, (320, 320));
        assert_eq!(config.alert_sound, PathBuf::from("ding.ogg"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(MonitorConfig::new().with_window_size(0).validate().is_err());
        assert!(MonitorConfig::new().with_visibility_threshold(1.5).validate().is_err());
        assert!(MonitorConfig::new().with_tolerances(-0.1, 5.0).validate().is_err());
        assert!(MonitorConfig::new().with_max_tilt_angle(200.0).validate().is_err());
        assert!(
            MonitorConfig::new()
                .with_alert_cooldown(Duration::ZERO)
                .validate()
                .is_ok()
        );
    }
}
