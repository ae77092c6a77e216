// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use crate::keypoints::Landmark;

/// Limbs of the upper body, the part of the skeleton a desk webcam sees.
pub const UPPER_BODY: [(Landmark, Landmark); 12] = [
    (Landmark::LeftShoulder, Landmark::RightShoulder),
    (Landmark::LeftShoulder, Landmark::LeftElbow),
    (Landmark::RightShoulder, Landmark::RightElbow),
    (Landmark::LeftElbow, Landmark::LeftWrist),
    (Landmark::RightElbow, Landmark::RightWrist),
    (Landmark::LeftEye, Landmark::RightEye),
    (Landmark::Nose, Landmark::LeftEye),
    (Landmark::Nose, Landmark::RightEye),
    (Landmark::LeftEye, Landmark::LeftEar),
    (Landmark::RightEye, Landmark::RightEar),
    (Landmark::LeftEar, Landmark::LeftShoulder),
    (Landmark::RightEar, Landmark::RightShoulder),
];

/// Pose palette index for each limb in [`UPPER_BODY`]: arms blue, face green.
pub const LIMB_COLOR_INDICES: [usize; 12] = [9, 9, 9, 9, 9, 16, 16, 16, 16, 16, 16, 16];

/// Pose palette index for each keypoint, in model output order.
pub const KPT_COLOR_INDICES: [usize; 17] = [16, 16, 16, 16, 16, 9, 9, 9, 9, 9, 9, 0, 0, 0, 0, 0, 0];
