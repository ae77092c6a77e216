// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Posture evaluation.
//!
//! The [`PostureEvaluator`] turns smoothed metrics into a [`Verdict`]. Rules are
//! checked in priority order:
//!
//! 1. Shoulder visibility gate.
//! 2. Calibrated mode, when a [`ReferencePosture`] has been saved.
//! 3. Fixed thresholds otherwise.

use std::fmt;

use crate::config::MonitorConfig;
use crate::smoothing::SmoothedMetrics;

/// Limits used by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Minimum visibility for each shoulder.
    pub visibility: f32,
    /// Fixed mode: minimum relative distance.
    pub min_relative_distance: f32,
    /// Fixed mode: maximum tilt angle in degrees.
    pub max_tilt_angle: f32,
    /// Calibrated mode: allowed distance deviation.
    pub distance_tolerance: f32,
    /// Calibrated mode: allowed angle deviation in degrees.
    pub angle_tolerance: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::from(&MonitorConfig::default())
    }
}

impl From<&MonitorConfig> for Thresholds {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            visibility: config.visibility_threshold,
            min_relative_distance: config.min_relative_distance,
            max_tilt_angle: config.max_tilt_angle,
            distance_tolerance: config.distance_tolerance,
            angle_tolerance: config.angle_tolerance,
        }
    }
}

/// A user-captured baseline posture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferencePosture {
    /// Relative distance at calibration time.
    pub target_distance: f32,
    /// Tilt angle at calibration time, in degrees.
    pub target_angle: f32,
}

/// Vertical head offset from the reference posture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadOffset {
    /// Ear has sunk towards the shoulder.
    TooLow,
    /// Ear has risen away from the shoulder.
    TooHigh,
}

/// Why an alert was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertReason {
    /// At least one shoulder is below the visibility threshold.
    ShouldersNotVisible,
    /// Outside the tolerance band around the reference posture.
    OffReference {
        /// Direction of the distance deviation.
        head: HeadOffset,
        /// Tilted further than the reference.
        leaning: bool,
    },
    /// Fixed thresholds exceeded.
    InadequatePosture,
}

impl fmt::Display for AlertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShouldersNotVisible => write!(f, "shoulders not visible"),
            Self::InadequatePosture => write!(f, "inadequate posture"),
            Self::OffReference { head, leaning } => {
                match head {
                    HeadOffset::TooLow => write!(f, "head too low")?,
                    HeadOffset::TooHigh => write!(f, "head too high")?,
                }
                if *leaning {
                    write!(f, ", leaning")?;
                }
                Ok(())
            }
        }
    }
}

/// Outcome of evaluating one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Posture is acceptable.
    Ok,
    /// Posture needs attention.
    Alert(AlertReason),
}

impl Verdict {
    /// Whether this verdict is an alert.
    #[must_use]
    pub const fn is_alert(&self) -> bool {
        matches!(self, Self::Alert(_))
    }

    /// The alert reason, if any.
    #[must_use]
    pub const fn reason(&self) -> Option<AlertReason> {
        match self {
            Self::Ok => None,
            Self::Alert(reason) => Some(*reason),
        }
    }
}

/// Stateful posture decision logic.
#[derive(Debug, Clone, Default)]
pub struct PostureEvaluator {
    thresholds: Thresholds,
    reference: Option<ReferencePosture>,
}

impl PostureEvaluator {
    /// Create an evaluator without a reference posture.
    #[must_use]
    pub const fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            reference: None,
        }
    }

    /// Evaluate smoothed metrics.
    #[must_use]
    pub fn evaluate(&self, metrics: &SmoothedMetrics) -> Verdict {
        let t = &self.thresholds;

        if metrics.left_visibility < t.visibility || metrics.right_visibility < t.visibility {
            return Verdict::Alert(AlertReason::ShouldersNotVisible);
        }

        if let Some(reference) = self.reference {
            let distance_delta = metrics.distance - reference.target_distance;
            let angle_delta = metrics.angle - reference.target_angle;

            if distance_delta.abs() <= t.distance_tolerance
                && angle_delta.abs() <= t.angle_tolerance
            {
                return Verdict::Ok;
            }

            // Either band tripping reports both deltas by sign
            let head = if distance_delta < 0.0 {
                HeadOffset::TooLow
            } else {
                HeadOffset::TooHigh
            };
            return Verdict::Alert(AlertReason::OffReference {
                head,
                leaning: angle_delta > 0.0,
            });
        }

        if metrics.distance < t.min_relative_distance || metrics.angle > t.max_tilt_angle {
            Verdict::Alert(AlertReason::InadequatePosture)
        } else {
            Verdict::Ok
        }
    }

    /// Capture the given smoothed metrics as the new reference posture.
    pub fn set_reference(&mut self, metrics: &SmoothedMetrics) -> ReferencePosture {
        let reference = ReferencePosture {
            target_distance: metrics.distance,
            target_angle: metrics.angle,
        };
        self.reference = Some(reference);
        reference
    }

    /// Remove the reference posture, returning it if one was set.
    pub const fn clear_reference(&mut self) -> Option<ReferencePosture> {
        self.reference.take()
    }

    /// The current reference posture.
    #[must_use]
    pub const fn reference(&self) -> Option<ReferencePosture> {
        self.reference
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_gate_takes_precedence() {
        let mut evaluator = PostureEvaluator::default();
        let good = SmoothedMetrics::new(0.3, 5.0).with_visibility(0.3, 0.9);

        assert_eq!(
            evaluator.evaluate(&good),
            Verdict::Alert(AlertReason::ShouldersNotVisible)
        );

        evaluator.set_reference(&SmoothedMetrics::new(0.3, 5.0));
        let verdict = evaluator.evaluate(&good);
        assert_eq!(verdict, Verdict::Alert(AlertReason::ShouldersNotVisible));
        assert_eq!(verdict.reason().unwrap().to_string(), "shoulders not visible");
    }

    #[test]
    fn test_fixed_thresholds() {
        let evaluator = PostureEvaluator::default();
        assert_eq!(evaluator.evaluate(&SmoothedMetrics::new(0.3, 10.0)), Verdict::Ok);
        assert_eq!(
            evaluator.evaluate(&SmoothedMetrics::new(0.1, 10.0)),
            Verdict::Alert(AlertReason::InadequatePosture)
        );
        assert_eq!(
            evaluator.evaluate(&SmoothedMetrics::new(0.3, 16.0)),
            Verdict::Alert(AlertReason::InadequatePosture)
        );
        assert_eq!(
            AlertReason::InadequatePosture.to_string(),
            "inadequate posture"
        );
    }

    #[test]
    fn test_calibration_round_trip() {
        let mut evaluator = PostureEvaluator::default();
        let saved = evaluator.set_reference(&SmoothedMetrics::new(0.3, 10.0));
        assert!((saved.target_distance - 0.3).abs() < f32::EPSILON);
        assert!((saved.target_angle - 10.0).abs() < f32::EPSILON);

        assert_eq!(evaluator.evaluate(&SmoothedMetrics::new(0.3, 10.0)), Verdict::Ok);

        let verdict = evaluator.evaluate(&SmoothedMetrics::new(0.15, 10.0));
        assert_eq!(
            verdict,
            Verdict::Alert(AlertReason::OffReference {
                head: HeadOffset::TooLow,
                leaning: false,
            })
        );
        assert!(verdict.reason().unwrap().to_string().contains("head too low"));
    }

    #[test]
    fn test_calibrated_mode_overrides_fixed_thresholds() {
        let mut evaluator = PostureEvaluator::default();
        // Would fail the fixed max angle of 15 degrees
        evaluator.set_reference(&SmoothedMetrics::new(0.3, 20.0));
        assert_eq!(evaluator.evaluate(&SmoothedMetrics::new(0.32, 23.0)), Verdict::Ok);
    }

    #[test]
    fn test_composed_reasons() {
        let mut evaluator = PostureEvaluator::default();
        evaluator.set_reference(&SmoothedMetrics::new(0.3, 10.0));

        let reason = evaluator
            .evaluate(&SmoothedMetrics::new(0.45, 18.0))
            .reason()
            .unwrap();
        assert_eq!(reason.to_string(), "head too high, leaning");

        let reason = evaluator
            .evaluate(&SmoothedMetrics::new(0.45, 2.0))
            .reason()
            .unwrap();
        assert_eq!(reason.to_string(), "head too high");
    }

    #[test]
    fn test_reason_reports_both_deltas_once_out_of_band() {
        let mut evaluator = PostureEvaluator::default();
        evaluator.set_reference(&SmoothedMetrics::new(0.3, 10.0));

        // Distance out of band, angle within band but above the reference
        assert_eq!(
            evaluator.evaluate(&SmoothedMetrics::new(0.1, 12.0)),
            Verdict::Alert(AlertReason::OffReference {
                head: HeadOffset::TooLow,
                leaning: true,
            })
        );

        // Angle out of band, distance within band but below the reference
        let verdict = evaluator.evaluate(&SmoothedMetrics::new(0.28, 20.0));
        assert_eq!(
            verdict.reason().unwrap().to_string(),
            "head too low, leaning"
        );

        // Angle out of band below the reference, distance unchanged
        let verdict = evaluator.evaluate(&SmoothedMetrics::new(0.3, 2.0));
        assert_eq!(
            verdict,
            Verdict::Alert(AlertReason::OffReference {
                head: HeadOffset::TooHigh,
                leaning: false,
            })
        );
        assert_eq!(verdict.reason().unwrap().to_string(), "head too high");
    }

    #[test]
    fn test_clear_reference_is_idempotent() {
        let mut evaluator = PostureEvaluator::default();
        assert!(evaluator.clear_reference().is_none());
        assert!(evaluator.reference().is_none());

        evaluator.set_reference(&SmoothedMetrics::new(0.3, 10.0));
        assert!(evaluator.clear_reference().is_some());
        assert!(evaluator.clear_reference().is_none());
        assert_eq!(
            evaluator.evaluate(&SmoothedMetrics::new(0.1, 10.0)),
            Verdict::Alert(AlertReason::InadequatePosture)
        );
    }
}
