// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Pose keypoint types.
//!
//! A [`Pose`] holds the 17 COCO keypoints of a single person, with coordinates
//! normalized to the frame size so that downstream metrics do not depend on the
//! camera resolution.

use std::fmt;

/// Number of keypoints in a COCO pose.
pub const NUM_KEYPOINTS: usize = 17;

/// A single skeletal landmark.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Keypoint {
    /// Horizontal position, 0.0 (left edge) to 1.0 (right edge).
    pub x: f32,
    /// Vertical position, 0.0 (top edge) to 1.0 (bottom edge).
    pub y: f32,
    /// Detector confidence that the landmark is visible (0.0 to 1.0).
    pub visibility: f32,
}

impl Keypoint {
    /// Create a new keypoint.
    #[must_use]
    pub const fn new(x: f32, y: f32, visibility: f32) -> Self {
        Self { x, y, visibility }
    }

    /// Euclidean distance to another keypoint, ignoring visibility.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Named COCO-Pose landmarks, in model output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Landmark {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl Landmark {
    /// Index of the landmark in the model output.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Lower-case landmark name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "left_eye",
            Self::RightEye => "right_eye",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
        }
    }
}

impl fmt::Display for Landmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The keypoints of one detected person.
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    keypoints: [Keypoint; NUM_KEYPOINTS],
    /// Detector score for the person (0.0 to 1.0).
    pub score: f32,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            keypoints: [Keypoint::default(); NUM_KEYPOINTS],
            score: 0.0,
        }
    }
}

impl Pose {
    /// Build a pose from keypoints in model output order.
    ///
    /// Returns `None` if fewer than [`NUM_KEYPOINTS`] keypoints are given; extra
    /// keypoints are ignored.
    #[must_use]
    pub fn from_keypoints(keypoints: &[Keypoint], score: f32) -> Option<Self> {
        let keypoints: [Keypoint; NUM_KEYPOINTS] =
            keypoints.get(..NUM_KEYPOINTS)?.try_into().ok()?;
        Some(Self { keypoints, score })
    }

    /// Replace a single landmark, returning the modified pose.
    #[must_use]
    pub fn with(mut self, landmark: Landmark, keypoint: Keypoint) -> Self {
        self.keypoints[landmark.index()] = keypoint;
        self
    }

    /// Get a landmark.
    #[must_use]
    pub const fn get(&self, landmark: Landmark) -> &Keypoint {
        &self.keypoints[landmark.index()]
    }

    /// All keypoints in model output order.
    #[must_use]
    pub const fn keypoints(&self) -> &[Keypoint; NUM_KEYPOINTS] {
        &self.keypoints
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_indices() {
        assert_eq!(Landmark::Nose.index(), 0);
        assert_eq!(Landmark::LeftEar.index(), 3);
        assert_eq!(Landmark::LeftShoulder.index(), 5);
        assert_eq!(Landmark::RightShoulder.index(), 6);
        assert_eq!(Landmark::RightAnkle.index(), NUM_KEYPOINTS - 1);
        assert_eq!(Landmark::LeftShoulder.to_string(), "left_shoulder");
    }

    #[test]
    fn test_pose_from_keypoints() {
        let kpts: Vec<Keypoint> = (0..NUM_KEYPOINTS)
            .map(|i| Keypoint::new(i as f32 / 20.0, 0.5, 0.9))
            .collect();
        let pose = Pose::from_keypoints(&kpts, 0.8).unwrap();
        assert!((pose.get(Landmark::RightShoulder).x - 0.3).abs() < 1e-6);
        assert!((pose.score - 0.8).abs() < f32::EPSILON);

        assert!(Pose::from_keypoints(&kpts[..10], 0.8).is_none());
    }

    #[test]
    fn test_pose_with_landmark() {
        let pose = Pose::default().with(Landmark::Nose, Keypoint::new(0.5, 0.2, 1.0));
        assert_eq!(*pose.get(Landmark::Nose), Keypoint::new(0.5, 0.2, 1.0));
        assert_eq!(*pose.get(Landmark::LeftEar), Keypoint::default());
    }

    #[test]
    fn test_keypoint_distance() {
        let a = Keypoint::new(0.0, 0.0, 1.0);
        let b = Keypoint::new(0.3, 0.4, 1.0);
        assert!((a.distance(&b) - 0.5).abs() < 1e-6);
    }
}
