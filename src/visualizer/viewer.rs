// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Monitor window backed by minifb.

use std::time::Duration;

use image::DynamicImage;
use minifb::{Key, KeyRepeat, Window, WindowOptions};

use super::{FrameDisplay, KeyEvent};
use crate::error::{MonitorError, Result};

/// A simple frame viewer using minifb.
pub struct Viewer {
    window: Window,
    width: usize,
    height: usize,
    buffer: Vec<u32>,
}

impl Viewer {
    /// Create a new viewer window.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::DisplayError`] if the window cannot be created.
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self> {
        let mut window = Window::new(
            title,
            width.max(1),
            height.max(1),
            WindowOptions {
                resize: true,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| MonitorError::DisplayError(format!("Failed to create window: {e}")))?;

        // ~60 Hz
        window.set_target_fps(60);

        Ok(Self {
            window,
            width,
            height,
            buffer: Vec::new(),
        })
    }

    /// Keep the last frame on screen for `duration`, or until the user quits.
    ///
    /// Returns `false` if the user asked to quit.
    pub fn hold(&mut self, duration: Duration) -> bool {
        let start = std::time::Instant::now();
        while start.elapsed() < duration {
            if self.poll_keys().contains(&KeyEvent::Quit) {
                return false;
            }
            if self.buffer.is_empty() {
                self.window.update();
            } else {
                let _ = self
                    .window
                    .update_with_buffer(&self.buffer, self.width, self.height);
            }
        }
        true
    }

    fn poll_keys(&self) -> Vec<KeyEvent> {
        let mut events: Vec<KeyEvent> = self
            .window
            .get_keys_pressed(KeyRepeat::No)
            .into_iter()
            .filter_map(|key| match key {
                Key::Q | Key::Escape => Some(KeyEvent::Quit),
                Key::S => Some(KeyEvent::SaveReference),
                Key::R => Some(KeyEvent::ResetReference),
                _ => None,
            })
            .collect();

        if !self.window.is_open() && !events.contains(&KeyEvent::Quit) {
            events.push(KeyEvent::Quit);
        }
        events
    }
}

impl FrameDisplay for Viewer {
    fn show(&mut self, image: &DynamicImage) -> Result<Vec<KeyEvent>> {
        let rgb = image.to_rgb8();
        let (width, height) = (rgb.width() as usize, rgb.height() as usize);

        // Pack as 0x00RRGGBB
        self.buffer.clear();
        self.buffer.extend(rgb.pixels().map(|p| {
            (u32::from(p[0]) << 16) | (u32::from(p[1]) << 8) | u32::from(p[2])
        }));
        self.width = width;
        self.height = height;

        if self.window.is_open() {
            self.window
                .update_with_buffer(&self.buffer, self.width, self.height)
                .map_err(|e| {
                    MonitorError::DisplayError(format!("Failed to update window: {e}"))
                })?;
        }

        Ok(self.poll_keys())
    }
}
