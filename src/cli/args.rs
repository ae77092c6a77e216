// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::config::{
    DEFAULT_ALERT_COOLDOWN, DEFAULT_ALERT_SOUND, DEFAULT_ANGLE_TOLERANCE,
    DEFAULT_DISTANCE_TOLERANCE, DEFAULT_MAX_TILT_ANGLE, DEFAULT_MIN_RELATIVE_DISTANCE,
    DEFAULT_VISIBILITY_THRESHOLD, DEFAULT_WINDOW_SIZE, MonitorConfig,
};
use crate::download::DEFAULT_POSE_MODEL;
use crate::error::{MonitorError, Result};

/// CLI arguments parser.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(after_help = r#"Keys (monitor window):
    S        Save the current posture as the reference
    R        Reset the reference and use fixed thresholds
    Q, Esc   Quit

Examples:
    posture-monitor run
    posture-monitor run --source 1 --cooldown 10
    posture-monitor run --source recording.mp4 --headless
    posture-monitor run --max-angle 20 --min-distance 0.12 --no-mirror"#)]
pub struct Cli {
    #[command(subcommand)]
    /// Subcommand to execute.
    pub command: Commands,
}

/// Commands for the CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Monitor posture from a webcam, video file or images
    Run(RunArgs),
}

/// Arguments for the run command.
#[derive(Args, Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunArgs {
    /// Input source (webcam index, video, image, directory, or glob)
    #[arg(short, long, default_value = "0")]
    pub source: String,

    /// Path to ONNX pose model file
    #[arg(short, long, default_value = DEFAULT_POSE_MODEL)]
    pub model: PathBuf,

    /// Minimum person confidence
    #[arg(long, default_value_t = 0.7)]
    pub conf: f32,

    /// Inference image size
    #[arg(long, default_value_t = 640)]
    pub imgsz: u32,

    /// ONNX Runtime intra-op threads (0 = automatic)
    #[arg(long, default_value_t = 0)]
    pub threads: usize,

    /// Do not mirror the camera image
    #[arg(long, default_value_t = false)]
    pub no_mirror: bool,

    /// Number of frames averaged by the smoother
    #[arg(long, default_value_t = DEFAULT_WINDOW_SIZE)]
    pub window: usize,

    /// Minimum shoulder visibility
    #[arg(long, default_value_t = DEFAULT_VISIBILITY_THRESHOLD)]
    pub visibility: f32,

    /// Minimum ear-to-shoulder distance relative to shoulder width
    #[arg(long, default_value_t = DEFAULT_MIN_RELATIVE_DISTANCE)]
    pub min_distance: f32,

    /// Maximum torso tilt in degrees
    #[arg(long, default_value_t = DEFAULT_MAX_TILT_ANGLE)]
    pub max_angle: f32,

    /// Allowed distance deviation from the reference posture
    #[arg(long, default_value_t = DEFAULT_DISTANCE_TOLERANCE)]
    pub distance_tolerance: f32,

    /// Allowed angle deviation from the reference posture, in degrees
    #[arg(long, default_value_t = DEFAULT_ANGLE_TOLERANCE)]
    pub angle_tolerance: f32,

    /// Seconds between audible alerts
    #[arg(long, default_value_t = DEFAULT_ALERT_COOLDOWN.as_secs_f64())]
    pub cooldown: f64,

    /// Alert sound file
    #[arg(long, default_value = DEFAULT_ALERT_SOUND)]
    pub sound: PathBuf,

    /// Consecutive capture failures before giving up
    #[arg(long, default_value_t = 30)]
    pub max_failures: usize,

    /// Run without a window (recorded sources only)
    #[arg(long, default_value_t = false)]
    pub headless: bool,

    /// Show verbose output
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub verbose: bool,
}

impl RunArgs {
    /// Build the monitor configuration from the arguments.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::ConfigError`] if `--cooldown` is negative or not a
    /// finite number of seconds.
    pub fn to_config(&self) -> Result<MonitorConfig> {
        let cooldown = Duration::try_from_secs_f64(self.cooldown).map_err(|_| {
            MonitorError::ConfigError(format!(
                "cooldown must be a non-negative number of seconds, got {}",
                self.cooldown
            ))
        })?;

        Ok(MonitorConfig::new()
            .with_model_path(&self.model)
            .with_detection_confidence(self.conf)
            .with_imgsz(self.imgsz, self.imgsz)
            .with_threads(self.threads)
            .with_mirror(!self.no_mirror)
            .with_window_size(self.window)
            .with_visibility_threshold(self.visibility)
            .with_min_relative_distance(self.min_distance)
            .with_max_tilt_angle(self.max_angle)
            .with_tolerances(self.distance_tolerance, self.angle_tolerance)
            .with_alert_cooldown(cooldown)
            .with_alert_sound(&self.sound)
            .with_max_capture_failures(self.max_failures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_args_defaults() {
        let args = Cli::parse_from(["app", "run"]);
        let Commands::Run(run) = args.command;
        assert_eq!(run.source, "0");
        assert_eq!(run.model, PathBuf::from(DEFAULT_POSE_MODEL));
        assert!(!run.headless);
        assert!(run.verbose);

        let config = run.to_config().unwrap();
        let defaults = MonitorConfig::default();
        assert_eq!(config.window_size, defaults.window_size);
        assert_eq!(config.alert_cooldown, defaults.alert_cooldown);
        assert!((config.detection_confidence - defaults.detection_confidence).abs() < f32::EPSILON);
        assert!(config.mirror);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_run_args_custom() {
        let args = Cli::parse_from([
            "app",
            "run",
            "--source",
            "session.mp4",
            "--max-angle",
            "20",
            "--cooldown",
            "2.5",
            "--no-mirror",
            "--headless",
            "--verbose",
            "false",
        ]);
        let Commands::Run(run) = args.command;
        assert_eq!(run.source, "session.mp4");
        assert!(run.headless);
        assert!(!run.verbose);

        let config = run.to_config().unwrap();
        assert!((config.max_tilt_angle - 20.0).abs() < f32::EPSILON);
        assert_eq!(config.alert_cooldown, Duration::from_millis(2500));
        assert!(!config.mirror);
    }

    #[test]
    fn test_invalid_cooldown_is_rejected() {
        for value in ["--cooldown=-5", "--cooldown=NaN", "--cooldown=inf"] {
            let args = Cli::parse_from(["app", "run", value]);
            let Commands::Run(run) = args.command;
            assert!(
                matches!(run.to_config(), Err(MonitorError::ConfigError(_))),
                "{value} should be rejected"
            );
        }

        let args = Cli::parse_from(["app", "run", "--cooldown", "0"]);
        let Commands::Run(run) = args.command;
        assert_eq!(run.to_config().unwrap().alert_cooldown, Duration::ZERO);
    }
}
