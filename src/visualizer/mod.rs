// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Display of annotated frames and keyboard input.

use image::DynamicImage;

use crate::error::Result;

/// Color definitions and palettes.
pub mod color;
/// COCO-Pose skeleton layout.
pub mod skeleton;

#[cfg(feature = "visualize")]
pub mod viewer;

pub use color::Color;

#[cfg(feature = "visualize")]
pub use viewer::Viewer;

/// Keyboard commands understood by the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyEvent {
    /// Stop monitoring (Q, Escape, or the window was closed).
    Quit,
    /// Capture the current smoothed metrics as the reference posture (S).
    SaveReference,
    /// Drop the reference posture and return to fixed thresholds (R).
    ResetReference,
}

/// A window that shows frames and reports key presses.
pub trait FrameDisplay {
    /// Present `image` and return the commands entered since the last call.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be presented.
    fn show(&mut self, image: &DynamicImage) -> Result<Vec<KeyEvent>>;
}
