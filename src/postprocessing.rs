// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Post-processing for YOLO pose outputs.
//!
//! The monitor tracks a single person, so instead of running NMS over all
//! candidates the highest-scoring one above the confidence threshold is kept.

use ndarray::{Array2, ArrayView2};

use crate::keypoints::{Keypoint, NUM_KEYPOINTS, Pose};
use crate::preprocessing::PreprocessResult;

/// Values per keypoint: x, y, confidence.
const KPT_DIM: usize = 3;

/// Box features preceding the class scores: cx, cy, w, h.
const BOX_DIM: usize = 4;

/// Keypoint features per prediction.
const KPT_FEATURES: usize = NUM_KEYPOINTS * KPT_DIM;

/// Lay out a raw pose output as a `[predictions, features]` matrix.
///
/// Accepts `[1, features, preds]` (the usual export), `[1, preds, features]`
/// and their 2D equivalents.
fn to_rows(output: &[f32], output_shape: &[usize]) -> Option<Array2<f32>> {
    let dims = match output_shape {
        [1, a, b] | [a, b] => (*a, *b),
        _ => return None,
    };

    // Features are fixed at 4 + classes + 51, predictions number in the thousands
    let (features, preds, transposed) = if dims.0 <= dims.1 {
        (dims.0, dims.1, false)
    } else {
        (dims.1, dims.0, true)
    };
    if preds == 0 || features < BOX_DIM + 1 + KPT_FEATURES {
        return None;
    }

    if transposed {
        Array2::from_shape_vec((preds, features), output.to_vec()).ok()
    } else {
        let view = ArrayView2::from_shape((features, preds), output).ok()?;
        Some(view.t().to_owned())
    }
}

/// Decode the most confident person from raw pose output.
///
/// Keypoints are mapped back through the letterbox and normalized by the original
/// frame size. Returns `None` when no candidate reaches `conf_threshold`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn decode_pose(
    output: &[f32],
    output_shape: &[usize],
    preprocess: &PreprocessResult,
    conf_threshold: f32,
) -> Option<Pose> {
    let rows = to_rows(output, output_shape)?;
    let num_classes = rows.ncols() - BOX_DIM - KPT_FEATURES;

    let (best_row, best_score) = rows
        .rows()
        .into_iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let score = row
                .iter()
                .skip(BOX_DIM)
                .take(num_classes)
                .copied()
                .filter(|s| !s.is_nan())
                .fold(0.0_f32, f32::max);
            (score >= conf_threshold).then_some((i, score))
        })
        .max_by(|a, b| a.1.total_cmp(&b.1))?;

    let row = rows.row(best_row);
    let (orig_h, orig_w) = preprocess.orig_shape;
    let (orig_h, orig_w) = (orig_h.max(1) as f32, orig_w.max(1) as f32);
    let kpt_start = BOX_DIM + num_classes;

    let keypoints: Vec<Keypoint> = (0..NUM_KEYPOINTS)
        .map(|k| {
            let offset = kpt_start + k * KPT_DIM;
            let (x, y) = preprocess
                .letterbox
                .unscale_point(row[offset], row[offset + 1]);
            Keypoint::new(
                (x / orig_w).clamp(0.0, 1.0),
                (y / orig_h).clamp(0.0, 1.0),
                row[offset + 2].clamp(0.0, 1.0),
            )
        })
        .collect();

    Pose::from_keypoints(&keypoints, best_score)
}
