// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Overlay drawing.
//!
//! The annotated frame carries the upper-body skeleton, a banner with the current
//! verdict, a readout of the smoothed metrics, the calibration status and the key
//! hints. Text needs the Arial font, fetched once into the user config directory;
//! without it only the shapes are drawn.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use image::{DynamicImage, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_line_segment_mut, draw_text_mut,
};
use imageproc::rect::Rect;

use crate::evaluator::{ReferencePosture, Verdict};
use crate::keypoints::Pose;
use crate::session::{Detection, FrameReport};
use crate::visualizer::Color;
use crate::visualizer::skeleton::{KPT_COLOR_INDICES, LIMB_COLOR_INDICES, UPPER_BODY};
use crate::{verbose, warn};

/// Assets URL for downloading fonts
const ASSETS_URL: &str = "https://github.com/ultralytics/assets/releases/download/v0.0.0";

/// Overlay font file name.
pub const FONT: &str = "Arial.ttf";

/// Keypoints below this confidence are not drawn.
const KEYPOINT_MIN_VISIBILITY: f32 = 0.5;

/// Key hints shown at the bottom of the panel.
pub const KEY_HINTS: &str = "S: save reference   R: reset   Q: quit";

/// Check if font exists locally or download it
pub fn check_font(font: &str) -> Option<PathBuf> {
    let font_name = Path::new(font).file_name()?.to_string_lossy().into_owned();
    let config_dir = dirs::config_dir()?.join("Ultralytics");
    let font_path = config_dir.join(&font_name);

    if font_path.exists() {
        return Some(font_path);
    }

    if let Err(e) = fs::create_dir_all(&config_dir) {
        warn!("Failed to create config directory: {e}");
        return None;
    }

    let url = format!("{ASSETS_URL}/{font_name}");
    verbose!("Downloading {url} to {}", font_path.display());

    let response = match ureq::get(&url).call() {
        Ok(response) => response,
        Err(e) => {
            warn!("Failed to download font from {url}: {e}");
            return None;
        }
    };

    let copied = File::create(&font_path)
        .and_then(|mut file| io::copy(&mut response.into_body().into_reader(), &mut file));
    if let Err(e) = copied {
        warn!("Failed to download font: {e}");
        let _ = fs::remove_file(&font_path);
        return None;
    }

    Some(font_path)
}

/// Everything the overlay shows besides the frame itself.
#[derive(Debug, Clone, Copy)]
pub struct OverlayState<'a> {
    /// Detected pose, in normalized coordinates.
    pub pose: Option<&'a Pose>,
    /// Result of processing the frame.
    pub report: &'a FrameReport,
    /// Current reference posture.
    pub reference: Option<ReferencePosture>,
    /// Transient status message.
    pub status: Option<&'a str>,
}

/// Banner text and background for the frame, if any.
#[must_use]
pub fn banner(report: &FrameReport) -> Option<(String, Color)> {
    match report.detection {
        Detection::Absent => Some(("No person detected".to_string(), Color::BLACK)),
        Detection::Present {
            verdict: Verdict::Alert(reason),
            ..
        } => Some((format!("BAD POSTURE: {reason}"), Color::RED)),
        Detection::Present { .. } => None,
    }
}

/// Panel text lines, top to bottom.
#[must_use]
pub fn panel_lines(state: &OverlayState<'_>) -> Vec<String> {
    let mut lines = Vec::with_capacity(5);

    if let Detection::Present { smoothed, .. } = state.report.detection {
        lines.push(format!(
            "Distance: {:.2}   Angle: {:.1}",
            smoothed.distance, smoothed.angle
        ));
        lines.push(format!(
            "Shoulders: L {:.2}   R {:.2}",
            smoothed.left_visibility, smoothed.right_visibility
        ));
    }

    lines.push(match state.reference {
        Some(r) => format!("Reference: d={:.2} a={:.1}", r.target_distance, r.target_angle),
        None => "Reference: fixed thresholds".to_string(),
    });

    if let Some(status) = state.status {
        lines.push(status.to_string());
    }
    lines.push(KEY_HINTS.to_string());
    lines
}

/// Draws the overlay onto frames.
pub struct Annotator {
    font: Option<FontVec>,
}

impl Annotator {
    /// Create an annotator, fetching the overlay font if needed.
    #[must_use]
    pub fn new() -> Self {
        let font = check_font(FONT).and_then(|path| {
            let data = fs::read(&path).ok()?;
            FontVec::try_from_vec(data)
                .map_err(|e| warn!("Invalid font {}: {e}", path.display()))
                .ok()
        });
        Self { font }
    }

    /// Create an annotator that only draws shapes.
    #[must_use]
    pub const fn without_font() -> Self {
        Self { font: None }
    }

    /// Whether text can be drawn.
    #[must_use]
    pub const fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Draw the overlay for `state` onto a copy of `image`.
    #[must_use]
    pub fn annotate(&self, image: &DynamicImage, state: &OverlayState<'_>) -> DynamicImage {
        let mut img = image.to_rgb8();
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return DynamicImage::ImageRgb8(img);
        }

        if let Some(pose) = state.pose {
            draw_skeleton(&mut img, pose);
        }

        #[allow(clippy::cast_precision_loss)]
        let text_px = (height as f32 / 28.0).clamp(12.0, 28.0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let line_h = (text_px * 1.4) as u32;

        if let Some((text, color)) = banner(state.report) {
            let banner_h = (line_h + line_h / 2).min(height);
            draw_filled_rect_mut(
                &mut img,
                Rect::at(0, 0).of_size(width, banner_h),
                color.to_rgb(),
            );
            let text_y = banner_h.saturating_sub(line_h) / 2 + 2;
            self.draw_text(&mut img, &text, 10, text_y, text_px * 1.2);
        }

        let lines = panel_lines(state);
        #[allow(clippy::cast_possible_truncation)]
        let panel_h = (line_h * lines.len() as u32 + 8).min(height);
        let panel_top = height - panel_h;
        if self.font.is_some() {
            draw_filled_rect_mut(
                &mut img,
                Rect::at(0, to_i32(panel_top)).of_size(width, panel_h),
                Color::BLACK.to_rgb(),
            );
        }
        for (i, line) in lines.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let y = panel_top + 4 + line_h * i as u32;
            self.draw_text(&mut img, line, 10, y, text_px);
        }

        DynamicImage::ImageRgb8(img)
    }

    fn draw_text(&self, img: &mut RgbImage, text: &str, x: u32, y: u32, px: f32) {
        if let Some(font) = &self.font {
            draw_text_mut(
                img,
                Color::WHITE.to_rgb(),
                to_i32(x),
                to_i32(y),
                PxScale::from(px),
                font,
                text,
            );
        }
    }
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Annotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Annotator")
            .field("has_font", &self.has_font())
            .finish()
    }
}

fn to_i32(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

/// Draw the upper-body limbs and keypoints that are confidently visible.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn draw_skeleton(img: &mut RgbImage, pose: &Pose) {
    let (w, h) = (img.width() as f32, img.height() as f32);
    let to_px = |x: f32, y: f32| (x * w, y * h);

    for (&(a, b), &color_idx) in UPPER_BODY.iter().zip(LIMB_COLOR_INDICES.iter()) {
        let (ka, kb) = (pose.get(a), pose.get(b));
        if ka.visibility < KEYPOINT_MIN_VISIBILITY || kb.visibility < KEYPOINT_MIN_VISIBILITY {
            continue;
        }
        let color = Color::from_pose_index(color_idx).to_rgb();
        let (start, end) = (to_px(ka.x, ka.y), to_px(kb.x, kb.y));
        // Two pixel wide line
        for offset in [0.0, 1.0] {
            draw_line_segment_mut(
                img,
                (start.0 + offset, start.1),
                (end.0 + offset, end.1),
                color,
            );
            draw_line_segment_mut(
                img,
                (start.0, start.1 + offset),
                (end.0, end.1 + offset),
                color,
            );
        }
    }

    let radius = ((h / 120.0).round() as i32).max(3);
    for (kp, &color_idx) in pose.keypoints().iter().zip(KPT_COLOR_INDICES.iter()) {
        if kp.visibility < KEYPOINT_MIN_VISIBILITY {
            continue;
        }
        let (x, y) = to_px(kp.x, kp.y);
        draw_filled_circle_mut(
            img,
            (x.round() as i32, y.round() as i32),
            radius,
            Color::from_pose_index(color_idx).to_rgb(),
        );
    }
}
