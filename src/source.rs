// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Frame sources for the monitor.
//!
//! A [`Source`] names where frames come from (webcam, video file, still images) and
//! [`Source::open`] turns it into a [`FrameSource`], the per-frame capture interface
//! consumed by the monitoring loop.

use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::error::{MonitorError, Result};

/// Per-frame capture interface.
pub trait FrameSource {
    /// Read the next frame.
    ///
    /// Returns `Ok(None)` once the source is exhausted. An `Err` is a failed read;
    /// the caller may retry on the next iteration.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame could not be captured or decoded.
    fn read(&mut self) -> Result<Option<DynamicImage>>;

    /// Human-readable description of the source.
    fn describe(&self) -> String;
}

/// Represents the different places frames can come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Webcam device index.
    Camera(u32),
    /// Path to a video file.
    Video(PathBuf),
    /// Path to a single image file.
    Image(PathBuf),
    /// Directory of images, replayed in file name order.
    Directory(PathBuf),
    /// Glob pattern for images, e.g. `frames/*.jpg`.
    Glob(String),
}

impl Default for Source {
    fn default() -> Self {
        Self::Camera(0)
    }
}

impl Source {
    /// Check if this source is a live camera.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Camera(_))
    }

    /// Open the source for reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the device or files cannot be opened, or if the needed
    /// capture feature was not compiled in.
    pub fn open(&self) -> Result<Box<dyn FrameSource>> {
        match self {
            Self::Camera(index) => open_camera(*index),
            Self::Video(path) => open_video(path),
            Self::Image(path) => Ok(Box::new(ImageSequence::new(vec![path.clone()]))),
            Self::Directory(path) => Ok(Box::new(ImageSequence::from_dir(path)?)),
            Self::Glob(pattern) => Ok(Box::new(ImageSequence::from_glob(pattern)?)),
        }
    }
}

/// Convert from a command-line string to Source.
impl From<&str> for Source {
    fn from(s: &str) -> Self {
        if let Ok(idx) = s.parse::<u32>() {
            return Self::Camera(idx);
        }

        if s.contains('*') {
            return Self::Glob(s.to_string());
        }

        let path = PathBuf::from(s);
        if path.is_dir() {
            return Self::Directory(path);
        }

        if let Some(ext) = path.extension() {
            let ext = ext.to_string_lossy().to_lowercase();
            if matches!(
                ext.as_str(),
                "mp4" | "avi" | "mov" | "mkv" | "wmv" | "flv" | "webm" | "m4v" | "mpeg" | "mpg"
            ) {
                return Self::Video(path);
            }
        }

        Self::Image(path)
    }
}

impl From<u32> for Source {
    fn from(idx: u32) -> Self {
        Self::Camera(idx)
    }
}

/// Check if a path is an image file based on extension.
fn is_image_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| {
        let ext = ext.to_string_lossy().to_lowercase();
        matches!(
            ext.as_str(),
            "jpg" | "jpeg" | "png" | "bmp" | "webp"
        )
    })
}

/// Replays still images as a frame stream.
#[derive(Debug, Clone)]
pub struct ImageSequence {
    paths: Vec<PathBuf>,
    next: usize,
}

impl ImageSequence {
    /// Replay the given image files in order.
    #[must_use]
    pub const fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths, next: 0 }
    }

    /// Replay every image in a directory, sorted by file name.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` is not a readable directory.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(MonitorError::CaptureError(format!(
                "Not a directory: {}",
                dir.display()
            )));
        }
        Ok(Self::new(Self::list_images(dir, None)?))
    }

    /// Replay images matching a simple `dir/*.ext` pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern's directory does not exist.
    pub fn from_glob(pattern: &str) -> Result<Self> {
        let Some(star_pos) = pattern.find('*') else {
            return Ok(Self::new(vec![PathBuf::from(pattern)]));
        };

        let dir_part = &pattern[..star_pos];
        let dir = if dir_part.is_empty() {
            Path::new(".")
        } else {
            Path::new(dir_part.trim_end_matches(['/', '\\']))
        };
        let ext_filter = pattern[star_pos..].strip_prefix("*.").map(str::to_lowercase);

        if !dir.is_dir() {
            return Err(MonitorError::CaptureError(format!(
                "Directory not found: {}",
                dir.display()
            )));
        }
        Ok(Self::new(Self::list_images(dir, ext_filter.as_deref())?))
    }

    fn list_images(dir: &Path, ext_filter: Option<&str>) -> Result<Vec<PathBuf>> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| match ext_filter {
                Some(ext) => path
                    .extension()
                    .is_some_and(|e| e.to_string_lossy().to_lowercase() == ext),
                None => is_image_file(path),
            })
            .collect();
        paths.sort();
        Ok(paths)
    }

    /// Number of images in the sequence.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether the sequence has no images.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for ImageSequence {
    fn read(&mut self) -> Result<Option<DynamicImage>> {
        let Some(path) = self.paths.get(self.next) else {
            return Ok(None);
        };
        self.next += 1;

        image::open(path).map(Some).map_err(|e| {
            MonitorError::ImageError(format!("Failed to load {}: {e}", path.display()))
        })
    }

    fn describe(&self) -> String {
        format!("{} image(s)", self.paths.len())
    }
}

#[cfg(feature = "camera")]
fn open_camera(index: u32) -> Result<Box<dyn FrameSource>> {
    Ok(Box::new(camera::CameraSource::open(index)?))
}

#[cfg(not(feature = "camera"))]
fn open_camera(index: u32) -> Result<Box<dyn FrameSource>> {
    Err(MonitorError::FeatureNotEnabled(format!(
        "Camera {index} requires the 'camera' feature"
    )))
}

#[cfg(feature = "video")]
fn open_video(path: &Path) -> Result<Box<dyn FrameSource>> {
    Ok(Box::new(video::VideoFileSource::open(path)?))
}

#[cfg(not(feature = "video"))]
fn open_video(path: &Path) -> Result<Box<dyn FrameSource>> {
    Err(MonitorError::FeatureNotEnabled(format!(
        "Video file {} requires the 'video' feature",
        path.display()
    )))
}

#[cfg(feature = "camera")]
pub use camera::CameraSource;

#[cfg(feature = "camera")]
mod camera {
    use image::{DynamicImage, RgbImage};
    use opencv::core::Mat;
    use opencv::prelude::*;
    use opencv::{imgproc, videoio};

    use super::FrameSource;
    use crate::error::{MonitorError, Result};

    /// Webcam capture through OpenCV.
    ///
    /// The device is released when the source is dropped.
    pub struct CameraSource {
        capture: videoio::VideoCapture,
        index: u32,
        frame: Mat,
        rgb: Mat,
    }

    impl CameraSource {
        /// Open a webcam by device index.
        ///
        /// # Errors
        ///
        /// Returns [`MonitorError::CaptureError`] if the device cannot be opened.
        pub fn open(index: u32) -> Result<Self> {
            let device = i32::try_from(index).map_err(|_| {
                MonitorError::CaptureError(format!("Invalid camera index {index}"))
            })?;
            let mut capture = videoio::VideoCapture::new(device, videoio::CAP_ANY)?;
            if !capture.is_opened()? {
                return Err(MonitorError::CaptureError(format!(
                    "Failed to open camera {index}"
                )));
            }
            // Keep latency low: only the newest frame matters
            capture.set(videoio::CAP_PROP_BUFFERSIZE, 1.0)?;

            Ok(Self {
                capture,
                index,
                frame: Mat::default(),
                rgb: Mat::default(),
            })
        }
    }

    impl FrameSource for CameraSource {
        fn read(&mut self) -> Result<Option<DynamicImage>> {
            if !self.capture.read(&mut self.frame)? || self.frame.empty() {
                return Err(MonitorError::CaptureError(format!(
                    "Camera {} returned no frame",
                    self.index
                )));
            }

            imgproc::cvt_color(&self.frame, &mut self.rgb, imgproc::COLOR_BGR2RGB, 0)?;

            let width = u32::try_from(self.rgb.cols())
                .map_err(|_| MonitorError::CaptureError("Negative frame width".to_string()))?;
            let height = u32::try_from(self.rgb.rows())
                .map_err(|_| MonitorError::CaptureError("Negative frame height".to_string()))?;
            let bytes = self.rgb.data_bytes()?.to_vec();

            let buffer = RgbImage::from_raw(width, height, bytes).ok_or_else(|| {
                MonitorError::ImageError("Failed to create image from camera frame".to_string())
            })?;
            Ok(Some(DynamicImage::ImageRgb8(buffer)))
        }

        fn describe(&self) -> String {
            format!("camera {}", self.index)
        }
    }

    impl Drop for CameraSource {
        fn drop(&mut self) {
            let _ = self.capture.release();
        }
    }
}

#[cfg(feature = "video")]
pub use video::VideoFileSource;

#[cfg(feature = "video")]
mod video {
    use std::path::{Path, PathBuf};
    use std::sync::Once;

    use image::DynamicImage;

    use super::FrameSource;
    use crate::error::{MonitorError, Result};

    static INIT: Once = Once::new();

    /// Video file replay through `video-rs`.
    pub struct VideoFileSource {
        decoder: video_rs::decode::Decoder,
        path: PathBuf,
    }

    impl VideoFileSource {
        /// Open a video file.
        ///
        /// # Errors
        ///
        /// Returns [`MonitorError::VideoError`] if the decoder cannot be created.
        pub fn open(path: &Path) -> Result<Self> {
            INIT.call_once(|| {
                if let Err(e) = video_rs::init() {
                    eprintln!("Failed to initialize video-rs: {e}");
                }
            });

            let decoder = video_rs::decode::Decoder::new(path).map_err(|e| {
                MonitorError::VideoError(format!("Failed to open {}: {e}", path.display()))
            })?;
            Ok(Self {
                decoder,
                path: path.to_path_buf(),
            })
        }
    }

    impl FrameSource for VideoFileSource {
        fn read(&mut self) -> Result<Option<DynamicImage>> {
            // Decoder errors at this point are end of stream
            let Ok((_ts, frame)) = self.decoder.decode() else {
                return Ok(None);
            };
            video_frame_to_image(&frame).map(Some)
        }

        fn describe(&self) -> String {
            format!("video {}", self.path.display())
        }
    }

    /// Convert a decoded HWC RGB frame to a `DynamicImage`.
    fn video_frame_to_image(frame: &video_rs::Frame) -> Result<DynamicImage> {
        let shape = frame.shape();
        let height = u32::try_from(shape[0])
            .map_err(|_| MonitorError::ImageError("Frame height exceeds u32::MAX".to_string()))?;
        let width = u32::try_from(shape[1])
            .map_err(|_| MonitorError::ImageError("Frame width exceeds u32::MAX".to_string()))?;

        let mut rgb_data = Vec::with_capacity(shape[0] * shape[1] * 3);
        for y in 0..shape[0] {
            for x in 0..shape[1] {
                rgb_data.push(frame[[y, x, 0]]);
                rgb_data.push(frame[[y, x, 1]]);
                rgb_data.push(frame[[y, x, 2]]);
            }
        }

        let buffer = image::RgbImage::from_raw(width, height, rgb_data).ok_or_else(|| {
            MonitorError::ImageError("Failed to create image from video frame".to_string())
        })?;
        Ok(DynamicImage::ImageRgb8(buffer))
    }
}
