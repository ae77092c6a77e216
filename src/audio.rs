// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Audible alerts.
//!
//! [`RodioSound`] plays a sound file through the default output device. The file is
//! read and decoded once at startup; each alert replays it from memory.

use std::path::Path;

use crate::alert::AlertSound;
use crate::warn;

#[cfg(feature = "audio")]
pub use rodio_sound::RodioSound;

#[cfg(feature = "audio")]
mod rodio_sound {
    use std::io::Cursor;
    use std::path::Path;
    use std::sync::Arc;

    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

    use crate::alert::AlertSound;
    use crate::error::{MonitorError, Result};
    use crate::warn;

    /// Alert sound backed by `rodio`.
    pub struct RodioSound {
        // Output stops when the stream is dropped
        _stream: OutputStream,
        handle: OutputStreamHandle,
        data: Arc<[u8]>,
        current: Option<Sink>,
    }

    impl RodioSound {
        /// Load a sound file and open the default output device.
        ///
        /// # Errors
        ///
        /// Returns [`MonitorError::AudioError`] if the file is missing, cannot be
        /// decoded, or no output device is available.
        pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
            let path = path.as_ref();
            let bytes = std::fs::read(path).map_err(|e| {
                MonitorError::AudioError(format!("Failed to read {}: {e}", path.display()))
            })?;
            let data: Arc<[u8]> = Arc::from(bytes);

            Decoder::new(Cursor::new(Arc::clone(&data))).map_err(|e| {
                MonitorError::AudioError(format!("Failed to decode {}: {e}", path.display()))
            })?;

            let (stream, handle) = OutputStream::try_default().map_err(|e| {
                MonitorError::AudioError(format!("Failed to open audio output: {e}"))
            })?;

            Ok(Self {
                _stream: stream,
                handle,
                data,
                current: None,
            })
        }
    }

    impl AlertSound for RodioSound {
        fn play(&mut self) {
            // A new alert restarts the sound
            if let Some(previous) = self.current.take() {
                previous.stop();
            }
            match self.handle.play_once(Cursor::new(Arc::clone(&self.data))) {
                Ok(sink) => self.current = Some(sink),
                Err(e) => {
                    warn!("Failed to play alert sound: {e}");
                }
            }
        }
    }
}

/// Load the alert sound, falling back to silent alerts on any failure.
#[must_use]
pub fn load_alert_sound(path: &Path) -> Option<Box<dyn AlertSound>> {
    #[cfg(feature = "audio")]
    {
        match RodioSound::load(path) {
            Ok(sound) => Some(Box::new(sound)),
            Err(e) => {
                warn!("{e}. Alerts will be visual only.");
                None
            }
        }
    }

    #[cfg(not(feature = "audio"))]
    {
        warn!(
            "Audio support requires the 'audio' feature, ignoring '{}'. Alerts will be visual only.",
            path.display()
        );
        None
    }
}
