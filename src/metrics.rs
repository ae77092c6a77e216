// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Posture metrics derived from pose keypoints.
//!
//! Two signals are computed per frame:
//!
//! - **relative distance**: vertical offset between the left ear and the left
//!   shoulder, divided by shoulder width. Drops when the head sinks forward.
//! - **tilt angle**: angle in degrees between the torso vector (shoulder midpoint
//!   to nose) and image-space up `(0, -1)`.

use crate::keypoints::{Keypoint, Landmark, Pose};

/// Added to denominators so degenerate poses never divide by zero.
pub const EPSILON: f32 = 1e-6;

/// Metrics extracted from a single frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostureMetrics {
    /// Ear-to-shoulder vertical distance relative to shoulder width (≥ 0).
    pub relative_distance: f32,
    /// Torso tilt from vertical in degrees, within [0, 180].
    pub tilt_angle: f32,
    /// Left shoulder visibility.
    pub left_visibility: f32,
    /// Right shoulder visibility.
    pub right_visibility: f32,
}

impl PostureMetrics {
    /// Extract metrics from a detected pose.
    #[must_use]
    pub fn from_pose(pose: &Pose) -> Self {
        extract_metrics(
            pose.get(Landmark::LeftShoulder),
            pose.get(Landmark::RightShoulder),
            pose.get(Landmark::LeftEar),
            pose.get(Landmark::Nose),
        )
    }
}

/// Compute posture metrics from the four keypoints they depend on.
#[must_use]
pub fn extract_metrics(
    left_shoulder: &Keypoint,
    right_shoulder: &Keypoint,
    left_ear: &Keypoint,
    nose: &Keypoint,
) -> PostureMetrics {
    let shoulder_width = left_shoulder.distance(right_shoulder) + EPSILON;
    let relative_distance = (left_ear.y - left_shoulder.y).abs() / shoulder_width;

    let mid_x = (left_shoulder.x + right_shoulder.x) / 2.0;
    let mid_y = (left_shoulder.y + right_shoulder.y) / 2.0;
    let torso = (nose.x - mid_x, nose.y - mid_y);

    // dot(torso, (0, -1)), and the vertical reference has unit length
    let dot = -torso.1;
    let cos_theta = dot / (torso.0.hypot(torso.1) + EPSILON);
    let tilt_angle = cos_theta.clamp(-1.0, 1.0).acos().to_degrees();

    PostureMetrics {
        relative_distance,
        tilt_angle,
        left_visibility: left_shoulder.visibility,
        right_visibility: right_shoulder.visibility,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kp(x: f32, y: f32) -> Keypoint {
        Keypoint::new(x, y, 1.0)
    }

    #[test]
    fn test_reference_geometry() {
        let m = extract_metrics(&kp(0.0, 0.0), &kp(1.0, 0.0), &kp(0.0, -0.3), &kp(0.5, -0.5));
        assert!((m.relative_distance - 0.3).abs() < 1e-4);
        assert!(m.tilt_angle.abs() < 0.5, "angle was {}", m.tilt_angle);
    }

    #[test]
    fn test_lean_angle() {
        // Nose displaced sideways as far as it is raised: 45 degrees
        let m = extract_metrics(&kp(0.4, 0.6), &kp(0.6, 0.6), &kp(0.4, 0.4), &kp(0.7, 0.4));
        assert!((m.tilt_angle - 45.0).abs() < 0.1);

        // Nose below the shoulders: pointing straight down
        let m = extract_metrics(&kp(0.4, 0.5), &kp(0.6, 0.5), &kp(0.4, 0.4), &kp(0.5, 0.8));
        assert!((m.tilt_angle - 180.0).abs() < 0.5);
    }

    #[test]
    fn test_degenerate_geometry_is_finite() {
        let p = kp(0.5, 0.5);
        let m = extract_metrics(&p, &p, &p, &p);
        assert!(m.relative_distance.is_finite());
        assert!(m.tilt_angle.is_finite());
        assert!((0.0..=180.0).contains(&m.tilt_angle));
    }

    #[test]
    fn test_metric_ranges() {
        let coords = [0.0, 0.13, 0.5, 0.77, 1.0];
        for &lx in &coords {
            for &ey in &coords {
                for &nx in &coords {
                    for &ny in &coords {
                        let left = kp(lx, 0.5);
                        let right = kp(1.0 - lx + 0.01, 0.55);
                        let m = extract_metrics(&left, &right, &kp(lx, ey), &kp(nx, ny));
                        assert!(m.relative_distance >= 0.0);
                        assert!((0.0..=180.0).contains(&m.tilt_angle));
                    }
                }
            }
        }
    }

    #[test]
    fn test_from_pose_carries_visibility() {
        let pose = Pose::default()
            .with(Landmark::LeftShoulder, Keypoint::new(0.4, 0.6, 0.3))
            .with(Landmark::RightShoulder, Keypoint::new(0.6, 0.6, 0.9))
            .with(Landmark::LeftEar, Keypoint::new(0.42, 0.45, 0.8))
            .with(Landmark::Nose, Keypoint::new(0.5, 0.4, 0.99));
        let m = PostureMetrics::from_pose(&pose);
        assert!((m.left_visibility - 0.3).abs() < f32::EPSILON);
        assert!((m.right_visibility - 0.9).abs() < f32::EPSILON);
        assert!((m.relative_distance - 0.75).abs() < 1e-3);
    }
}
