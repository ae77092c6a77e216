// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Pose model loading and inference.
//!
//! [`PoseEstimator`] is the seam between the monitoring loop and the detector.
//! [`YoloPoseModel`] implements it with a YOLO pose network running on ONNX Runtime.

use std::path::Path;

use image::DynamicImage;
use ndarray::Array4;
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::TensorRef;

use crate::config::MonitorConfig;
use crate::download::ensure_model;
use crate::error::{MonitorError, Result};
use crate::keypoints::Pose;
use crate::postprocessing::decode_pose;
use crate::preprocessing::preprocess_image;
use crate::verbose;

/// Something that finds a person's pose in a frame.
pub trait PoseEstimator {
    /// Estimate the pose of the most prominent person.
    ///
    /// Returns `Ok(None)` when nobody is detected.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    fn estimate(&mut self, image: &DynamicImage) -> Result<Option<Pose>>;
}

/// YOLO pose model running on ONNX Runtime.
///
/// # Example
///
/// ```no_run
/// use posture_monitor::{MonitorConfig, PoseEstimator, YoloPoseModel};
///
/// let mut model = YoloPoseModel::load(&MonitorConfig::default())?;
/// let frame = image::open("frame.jpg")?;
/// if let Some(pose) = model.estimate(&frame)? {
///     println!("person score {:.2}", pose.score);
/// }
/// # Ok::<(), posture_monitor::MonitorError>(())
/// ```
pub struct YoloPoseModel {
    session: Session,
    input_name: String,
    output_name: String,
    /// Input size as (height, width).
    imgsz: (u32, u32),
    confidence: f32,
    warmed_up: bool,
}

impl YoloPoseModel {
    /// Load the pose model named by `config`, downloading the default model if it
    /// is missing.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::ModelLoadError`] if the model cannot be found,
    /// downloaded or loaded.
    pub fn load(config: &MonitorConfig) -> Result<Self> {
        let path = ensure_model(&config.model_path)?;
        Self::load_from_file(&path, config)
    }

    /// Load a pose model from an existing ONNX file.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::ModelLoadError`] if the file is missing or invalid.
    pub fn load_from_file(path: &Path, config: &MonitorConfig) -> Result<Self> {
        if !path.exists() {
            return Err(MonitorError::ModelLoadError(format!(
                "Model file not found: {}",
                path.display()
            )));
        }

        let session = Session::builder()
            .map_err(|e| {
                MonitorError::ModelLoadError(format!("Failed to create session builder: {e}"))
            })?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| {
                MonitorError::ModelLoadError(format!("Failed to set optimization level: {e}"))
            })?
            .with_intra_threads(config.num_threads)
            .map_err(|e| {
                MonitorError::ModelLoadError(format!("Failed to set intra-thread count: {e}"))
            })?
            .commit_from_file(path)
            .map_err(|e| MonitorError::ModelLoadError(format!("Failed to load model: {e}")))?;

        let input_name = session
            .inputs
            .first()
            .map_or_else(|| "images".to_string(), |i| i.name.clone());
        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| MonitorError::ModelLoadError("Model has no outputs".to_string()))?;

        // Exported models record their input size; fall back to the configured one
        let imgsz = session
            .metadata()
            .ok()
            .and_then(|m| m.custom("imgsz").ok().flatten())
            .and_then(|s| parse_imgsz(&s))
            .unwrap_or(config.imgsz);

        verbose!(
            "Loaded {} (input {}x{}, {} threads)",
            path.display(),
            imgsz.1,
            imgsz.0,
            if config.num_threads == 0 {
                "auto".to_string()
            } else {
                config.num_threads.to_string()
            }
        );

        Ok(Self {
            session,
            input_name,
            output_name,
            imgsz,
            confidence: config.detection_confidence,
            warmed_up: false,
        })
    }

    /// Run one inference on a blank input so the first real frame is not slow.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    pub fn warmup(&mut self) -> Result<()> {
        if self.warmed_up {
            return Ok(());
        }
        let (h, w) = self.imgsz;
        let dummy = Array4::<f32>::zeros((1, 3, h as usize, w as usize));
        self.run_inference(&dummy)?;
        self.warmed_up = true;
        Ok(())
    }

    fn run_inference(&mut self, input: &Array4<f32>) -> Result<(Vec<f32>, Vec<usize>)> {
        let input_contiguous = input.as_standard_layout();
        let input_tensor = TensorRef::from_array_view(&input_contiguous).map_err(|e| {
            MonitorError::InferenceError(format!("Failed to create input tensor: {e}"))
        })?;

        let outputs = self
            .session
            .run(ort::inputs![&self.input_name => input_tensor])
            .map_err(|e| MonitorError::InferenceError(format!("Inference failed: {e}")))?;

        let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
            MonitorError::InferenceError(format!("Output '{}' not found", self.output_name))
        })?;
        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| MonitorError::InferenceError(format!("Failed to extract output: {e}")))?;

        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let shape: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();
        Ok((data.to_vec(), shape))
    }

    /// Model input size as (height, width).
    #[must_use]
    pub const fn imgsz(&self) -> (u32, u32) {
        self.imgsz
    }
}

impl PoseEstimator for YoloPoseModel {
    fn estimate(&mut self, image: &DynamicImage) -> Result<Option<Pose>> {
        self.warmup()?;

        let preprocess = preprocess_image(image, self.imgsz);
        let (output, shape) = self.run_inference(&preprocess.tensor)?;
        Ok(decode_pose(&output, &shape, &preprocess, self.confidence))
    }
}

impl std::fmt::Debug for YoloPoseModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoloPoseModel")
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .field("imgsz", &self.imgsz)
            .field("confidence", &self.confidence)
            .finish_non_exhaustive()
    }
}

/// Parse an `imgsz` metadata value such as `[640, 640]` or `640`.
fn parse_imgsz(value: &str) -> Option<(u32, u32)> {
    let dims: Vec<u32> = value
        .trim_matches(|c: char| c == '[' || c == ']' || c.is_whitespace())
        .split(',')
        .map(|s| s.trim().parse().ok())
        .collect::<Option<_>>()?;

    match dims.as_slice() {
        [s] if *s > 0 => Some((*s, *s)),
        [h, w] if *h > 0 && *w > 0 => Some((*h, *w)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_not_found() {
        let result = YoloPoseModel::load_from_file(
            Path::new("nonexistent-pose.onnx"),
            &MonitorConfig::default(),
        );
        assert!(matches!(result, Err(MonitorError::ModelLoadError(_))));
    }

    #[test]
    fn test_custom_model_is_not_downloaded() {
        let config = MonitorConfig::default().with_model_path("missing/custom.onnx");
        assert!(matches!(
            YoloPoseModel::load(&config),
            Err(MonitorError::ModelLoadError(_))
        ));
    }

    #[test]
    fn test_parse_imgsz() {
        assert_eq!(parse_imgsz("[640, 640]"), Some((640, 640)));
        assert_eq!(parse_imgsz("[384, 640]"), Some((384, 640)));
        assert_eq!(parse_imgsz("320"), Some((320, 320)));
        assert_eq!(parse_imgsz("[0, 640]"), None);
        assert_eq!(parse_imgsz("big"), None);
    }
}
