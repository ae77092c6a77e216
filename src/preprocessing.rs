// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Image preprocessing for pose inference.
//!
//! Frames are letterboxed to the model input size (aspect ratio preserved, gray
//! padding centered on both sides), normalized to [0, 1] and laid out as NCHW.

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};
use ndarray::Array4;

/// Letterbox padding color (gray).
pub const LETTERBOX_COLOR: [u8; 3] = [114, 114, 114];

/// Geometry of a letterbox transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    /// Resized content size (width, height) inside the canvas.
    pub new_size: (u32, u32),
    /// Scale factors applied (`scale_y`, `scale_x`).
    pub scale: (f32, f32),
    /// Padding applied (`pad_top`, `pad_left`).
    pub padding: (f32, f32),
}

impl Letterbox {
    /// Compute the letterbox geometry for an image of `orig_width` x `orig_height`
    /// fitted into `target_size` (height, width).
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn new(orig_width: u32, orig_height: u32, target_size: (u32, u32)) -> Self {
        let (target_h, target_w) = target_size;
        let (orig_h, orig_w) = (orig_height.max(1) as f32, orig_width.max(1) as f32);

        let scale = (target_h as f32 / orig_h).min(target_w as f32 / orig_w);
        let new_w = ((orig_w * scale).round() as u32).clamp(1, target_w.max(1));
        let new_h = ((orig_h * scale).round() as u32).clamp(1, target_h.max(1));

        let pad_left = target_w.saturating_sub(new_w) / 2;
        let pad_top = target_h.saturating_sub(new_h) / 2;

        Self {
            new_size: (new_w, new_h),
            scale: (new_h as f32 / orig_h, new_w as f32 / orig_w),
            padding: (pad_top as f32, pad_left as f32),
        }
    }

    /// Map a point from model input space back to original image pixels.
    #[must_use]
    pub fn unscale_point(&self, x: f32, y: f32) -> (f32, f32) {
        let (scale_y, scale_x) = self.scale;
        let (pad_top, pad_left) = self.padding;
        ((x - pad_left) / scale_x, (y - pad_top) / scale_y)
    }
}

/// Result of preprocessing a frame.
#[derive(Debug, Clone)]
pub struct PreprocessResult {
    /// Preprocessed image tensor in NCHW format, normalized to [0, 1].
    pub tensor: Array4<f32>,
    /// Original image dimensions (height, width).
    pub orig_shape: (u32, u32),
    /// Transform applied to reach the model input size.
    pub letterbox: Letterbox,
}

/// Preprocess a frame for pose inference.
///
/// `target_size` is the model input size as (height, width).
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn preprocess_image(image: &DynamicImage, target_size: (u32, u32)) -> PreprocessResult {
    let rgb = image.to_rgb8();
    let (orig_w, orig_h) = rgb.dimensions();
    let letterbox = Letterbox::new(orig_w, orig_h, target_size);

    let (new_w, new_h) = letterbox.new_size;
    let resized = if (new_w, new_h) == (orig_w, orig_h) {
        rgb
    } else {
        imageops::resize(&rgb, new_w, new_h, FilterType::Triangle)
    };

    let (target_h, target_w) = target_size;
    let mut canvas = RgbImage::from_pixel(target_w, target_h, Rgb(LETTERBOX_COLOR));
    let (pad_top, pad_left) = letterbox.padding;
    imageops::replace(
        &mut canvas,
        &resized,
        i64::from(pad_left as u32),
        i64::from(pad_top as u32),
    );

    PreprocessResult {
        tensor: image_to_tensor(&canvas),
        orig_shape: (orig_h, orig_w),
        letterbox,
    }
}

/// Convert an RGB image to a normalized NCHW tensor.
fn image_to_tensor(image: &RgbImage) -> Array4<f32> {
    let (width, height) = image.dimensions();
    let (w, h) = (width as usize, height as usize);

    let mut tensor = Array4::zeros((1, 3, h, w));
    for (x, y, pixel) in image.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for c in 0..3 {
            tensor[[0, c, y, x]] = f32::from(pixel[c]) / 255.0;
        }
    }
    tensor
}
