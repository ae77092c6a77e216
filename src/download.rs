// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Pose model download.
//!
//! The default pose model is fetched from the Ultralytics assets release the first
//! time it is needed. Other model paths must already exist on disk.

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::{MonitorError, Result};

/// Default pose model file name.
pub const DEFAULT_POSE_MODEL: &str = "yolo11n-pose.onnx";

/// Release URL for the default pose model.
const DEFAULT_POSE_MODEL_URL: &str =
    "https://github.com/ultralytics/assets/releases/download/v8.3.0/yolo11n-pose.onnx";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const READ_TIMEOUT: Duration = Duration::from_secs(300);

/// Format bytes as a human-readable string (e.g., "5.9MB").
fn format_bytes(bytes: f64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    if bytes >= MB {
        format!("{:.1}MB", bytes / MB)
    } else if bytes >= KB {
        format!("{:.1}KB", bytes / KB)
    } else {
        format!("{bytes:.0}B")
    }
}

/// Single-line download progress written to stderr.
struct Progress {
    desc: String,
    total: Option<u64>,
    done: u64,
    start: Instant,
    last_draw: Instant,
}

impl Progress {
    const BAR_WIDTH: usize = 12;
    const REDRAW_INTERVAL: Duration = Duration::from_millis(100);

    fn new(desc: String, total: Option<u64>) -> Self {
        let now = Instant::now();
        Self {
            desc,
            total,
            done: 0,
            start: now,
            last_draw: now,
        }
    }

    fn advance(&mut self, bytes: usize) {
        self.done += bytes as u64;
        if self.last_draw.elapsed() >= Self::REDRAW_INTERVAL {
            self.last_draw = Instant::now();
            eprint!("\r\x1b[K{}", self.line());
            std::io::stderr().flush().ok();
        }
    }

    fn finish(&self) {
        eprintln!("\r\x1b[K{}", self.line());
    }

    #[allow(clippy::cast_precision_loss)]
    fn line(&self) -> String {
        let elapsed = self.start.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 {
            self.done as f64 / elapsed
        } else {
            0.0
        };

        match self.total.filter(|&t| t > 0) {
            Some(total) => {
                let fraction = (self.done as f64 / total as f64).min(1.0);
                format!(
                    "{}: {:>3.0}% {} {}/{} {}/s {elapsed:.1}s",
                    self.desc,
                    fraction * 100.0,
                    bar(fraction, Self::BAR_WIDTH),
                    format_bytes(self.done as f64),
                    format_bytes(total as f64),
                    format_bytes(rate),
                )
            }
            None => format!(
                "{}: {} {}/s {elapsed:.1}s",
                self.desc,
                format_bytes(self.done as f64),
                format_bytes(rate),
            ),
        }
    }
}

/// Render a progress bar of `width` cells.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn bar(fraction: f64, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f64) as usize).min(width);
    format!("{}{}", "━".repeat(filled), "─".repeat(width - filled))
}

/// Stream `url` into `dest` via a `.part` file that is renamed on success.
fn download_file(url: &str, dest: &Path) -> Result<()> {
    let config = ureq::Agent::config_builder()
        .timeout_connect(Some(CONNECT_TIMEOUT))
        .timeout_recv_body(Some(READ_TIMEOUT))
        .build();
    let agent = ureq::Agent::new_with_config(config);

    let response = agent.get(url).call().map_err(|e| {
        MonitorError::ModelLoadError(match &e {
            ureq::Error::Timeout(_) => format!("Connection timed out while downloading {url}"),
            _ => format!("Failed to download {url}: {e}"),
        })
    })?;

    let total = response
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok());

    let temp_path = dest.with_extension("part");
    let _ = fs::remove_file(&temp_path);

    let mut progress = Progress::new(format!("Downloading {url} to '{}'", dest.display()), total);
    let mut reader = response.into_body().into_reader();

    let streamed = (|| -> Result<()> {
        let mut writer = BufWriter::new(File::create(&temp_path)?);
        let mut buffer = [0u8; 64 * 1024];
        loop {
            let n = reader.read(&mut buffer).map_err(|e| {
                MonitorError::ModelLoadError(format!("Failed to read from network: {e}"))
            })?;
            if n == 0 {
                break;
            }
            writer.write_all(&buffer[..n])?;
            progress.advance(n);
        }
        writer.flush()?;
        Ok(())
    })();

    if let Err(e) = streamed {
        eprintln!();
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }
    progress.finish();

    fs::rename(&temp_path, dest).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        MonitorError::ModelLoadError(format!(
            "Failed to move downloaded file to {}: {e}",
            dest.display()
        ))
    })
}

/// Make sure the model at `model_path` exists, downloading the default pose model
/// if that is what was asked for.
///
/// # Errors
///
/// Returns [`MonitorError::ModelLoadError`] if the file is missing and is not the
/// default pose model, or if the download fails.
pub fn ensure_model<P: AsRef<Path>>(model_path: P) -> Result<PathBuf> {
    let path = model_path.as_ref();
    if path.exists() {
        return Ok(path.to_path_buf());
    }

    let is_default = path.file_name().and_then(|n| n.to_str()) == Some(DEFAULT_POSE_MODEL);
    if !is_default {
        return Err(MonitorError::ModelLoadError(format!(
            "Model file not found: {}. Auto-download is only supported for {DEFAULT_POSE_MODEL}",
            path.display()
        )));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    download_file(DEFAULT_POSE_MODEL_URL, path)?;
    Ok(path.to_path_buf())
}
