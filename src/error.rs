// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Error types for the posture monitor.

use std::fmt;

/// Result type alias for posture monitor operations.
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Main error type for the posture monitor.
#[derive(Debug)]
pub enum MonitorError {
    /// Camera or frame source could not be opened or keeps failing.
    CaptureError(String),
    /// Error loading the pose model.
    ModelLoadError(String),
    /// Error during pose inference.
    InferenceError(String),
    /// Error processing images.
    ImageError(String),
    /// Invalid configuration provided.
    ConfigError(String),
    /// Alert sound could not be loaded or played.
    AudioError(String),
    /// Display window error.
    DisplayError(String),
    /// Video decoding error.
    VideoError(String),
    /// Wrapped `std::io::Error` (file not found, permission denied, etc.).
    Io(std::io::Error),
    /// Feature not enabled.
    FeatureNotEnabled(String),
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CaptureError(msg) => write!(f, "Capture error: {msg}"),
            Self::ModelLoadError(msg) => write!(f, "Model load error: {msg}"),
            Self::InferenceError(msg) => write!(f, "Inference error: {msg}"),
            Self::ImageError(msg) => write!(f, "Image error: {msg}"),
            Self::ConfigError(msg) => write!(f, "Config error: {msg}"),
            Self::AudioError(msg) => write!(f, "Audio error: {msg}"),
            Self::DisplayError(msg) => write!(f, "Display error: {msg}"),
            Self::VideoError(msg) => write!(f, "Video error: {msg}"),
            Self::Io(err) => write!(f, "IO error: {err}"),
            Self::FeatureNotEnabled(msg) => write!(f, "Feature not enabled: {msg}"),
        }
    }
}

impl std::error::Error for MonitorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MonitorError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<image::ImageError> for MonitorError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageError(err.to_string())
    }
}

#[cfg(feature = "camera")]
impl From<opencv::Error> for MonitorError {
    fn from(err: opencv::Error) -> Self {
        Self::CaptureError(err.to_string())
    }
}
