// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! The monitoring loop.

use std::time::{Duration, Instant};

use image::DynamicImage;

#[cfg(feature = "annotate")]
use crate::annotate::{Annotator, OverlayState};
use crate::alert::AlertSound;
use crate::audio::load_alert_sound;
use crate::cli::args::RunArgs;
use crate::config::MonitorConfig;
use crate::error::{MonitorError, Result};
use crate::keypoints::Pose;
use crate::model::{PoseEstimator, YoloPoseModel};
use crate::session::{Control, FrameReport, MonitorSession};
use crate::source::{FrameSource, Source};
use crate::visualizer::{FrameDisplay, KeyEvent};
use crate::{VERSION, alert, info, section, success, verbose, warn};

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The user asked to quit.
    Quit,
    /// The source ran out of frames.
    EndOfStream,
}

/// Totals of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Frames processed.
    pub frames: usize,
    /// Frames with a detected person.
    pub detections: usize,
    /// Frames whose verdict was an alert.
    pub alert_frames: usize,
    /// Alerts fired.
    pub alerts_fired: usize,
    /// Wall time of the loop.
    pub elapsed: Duration,
    /// Why the loop stopped.
    pub stop: StopReason,
}

/// Drives frames through detection, evaluation and display.
pub struct Monitor {
    session: MonitorSession,
    mirror: bool,
    max_capture_failures: usize,
    #[cfg(feature = "annotate")]
    annotator: Option<Annotator>,
}

impl Monitor {
    /// Create a monitor. Frames are shown unannotated until an annotator is set.
    #[must_use]
    pub fn new(config: &MonitorConfig, sound: Option<Box<dyn AlertSound>>) -> Self {
        Self {
            session: MonitorSession::new(config, sound),
            mirror: config.mirror,
            max_capture_failures: config.max_capture_failures.max(1),
            #[cfg(feature = "annotate")]
            annotator: None,
        }
    }

    /// Draw the overlay on displayed frames.
    #[cfg(feature = "annotate")]
    #[must_use]
    pub fn with_annotator(mut self, annotator: Annotator) -> Self {
        self.annotator = Some(annotator);
        self
    }

    /// The session state.
    #[must_use]
    pub const fn session(&self) -> &MonitorSession {
        &self.session
    }

    /// Run until the user quits or the source is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::CaptureError`] after too many consecutive failed
    /// reads, and propagates inference and display errors.
    pub fn run(
        &mut self,
        frames: &mut dyn FrameSource,
        estimator: &mut dyn PoseEstimator,
        mut display: Option<&mut dyn FrameDisplay>,
    ) -> Result<RunSummary> {
        let start = Instant::now();
        let mut failures = 0usize;

        let stop = loop {
            let frame = match frames.read() {
                Ok(Some(frame)) => {
                    failures = 0;
                    frame
                }
                Ok(None) => break StopReason::EndOfStream,
                Err(e) => {
                    failures += 1;
                    if failures >= self.max_capture_failures {
                        return Err(MonitorError::CaptureError(format!(
                            "{failures} consecutive capture failures, last: {e}"
                        )));
                    }
                    warn!("Skipping frame ({failures}/{}): {e}", self.max_capture_failures);
                    continue;
                }
            };
            let frame = if self.mirror { frame.fliph() } else { frame };

            let pose = estimator.estimate(&frame)?;
            let now = Instant::now();
            let report = self.session.process(pose.as_ref(), now);

            if report.alert_fired
                && let Some(reason) = report.verdict().and_then(|v| v.reason())
            {
                alert!("{reason}");
            }

            if let Some(display) = display.as_deref_mut() {
                let shown = self.render(&frame, pose.as_ref(), &report, now);
                if self.apply_keys(display.show(&shown)?) == Control::Quit {
                    break StopReason::Quit;
                }
            }
        };

        Ok(RunSummary {
            frames: self.session.frames(),
            detections: self.session.detections(),
            alert_frames: self.session.alert_frames(),
            alerts_fired: self.session.dispatcher().fired(),
            elapsed: start.elapsed(),
            stop,
        })
    }

    fn apply_keys(&mut self, keys: Vec<KeyEvent>) -> Control {
        for key in keys {
            let now = Instant::now();
            if self.session.handle_key(key, now) == Control::Quit {
                return Control::Quit;
            }
            if let Some(status) = self.session.status(now) {
                info!("{status}");
            }
        }
        Control::Continue
    }

    #[cfg(feature = "annotate")]
    fn render(
        &self,
        frame: &DynamicImage,
        pose: Option<&Pose>,
        report: &FrameReport,
        now: Instant,
    ) -> DynamicImage {
        let Some(annotator) = &self.annotator else {
            return frame.clone();
        };
        annotator.annotate(
            frame,
            &OverlayState {
                pose,
                report,
                reference: self.session.reference(),
                status: self.session.status(now),
            },
        )
    }

    #[cfg(not(feature = "annotate"))]
    #[allow(clippy::unused_self)]
    fn render(
        &self,
        frame: &DynamicImage,
        _pose: Option<&Pose>,
        _report: &FrameReport,
        _now: Instant,
    ) -> DynamicImage {
        frame.clone()
    }
}

/// Run the posture monitor from command-line arguments.
///
/// Every resource (capture device, window, audio stream) is owned by this
/// function and released when it returns, on success and on error.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the source or model cannot
/// be opened, or the loop fails.
#[allow(clippy::cast_precision_loss)]
pub fn run_monitor(args: &RunArgs) -> Result<()> {
    let source = Source::from(args.source.as_str());
    // Without a window a live camera has no quit key
    if args.headless && source.is_live() {
        return Err(MonitorError::ConfigError(format!(
            "--headless needs a recorded source, '{}' is a live camera",
            args.source
        )));
    }
    // Only a live camera faces the user
    let config = args.to_config()?.with_mirror(!args.no_mirror && source.is_live());
    config.validate()?;

    section!("Posture Monitor v{VERSION}");

    let mut frames = source.open()?;
    info!("Source: {}", frames.describe());

    let mut model = YoloPoseModel::load(&config)?;
    model.warmup()?;
    verbose!("Model ready: {}", config.model_path.display());

    let sound = load_alert_sound(&config.alert_sound);
    if sound.is_some() {
        verbose!("Alert sound: {}", config.alert_sound.display());
    }

    let monitor = Monitor::new(&config, sound);
    let summary = run_with_display(
        monitor,
        frames.as_mut(),
        &mut model,
        args.headless,
        source.is_live(),
    )?;

    section!("Summary");
    let fps = if summary.elapsed.as_secs_f64() > 0.0 {
        summary.frames as f64 / summary.elapsed.as_secs_f64()
    } else {
        0.0
    };
    info!(
        "{} frames in {:.1}s ({fps:.1} FPS), person detected in {}",
        summary.frames,
        summary.elapsed.as_secs_f64(),
        summary.detections
    );
    info!(
        "{} frames with bad posture, {} alerts",
        summary.alert_frames, summary.alerts_fired
    );
    success!("Monitoring finished");
    Ok(())
}

#[cfg(feature = "visualize")]
fn run_with_display(
    monitor: Monitor,
    frames: &mut dyn FrameSource,
    model: &mut YoloPoseModel,
    headless: bool,
    live: bool,
) -> Result<RunSummary> {
    use crate::visualizer::Viewer;

    if headless {
        let mut monitor = monitor;
        return monitor.run(frames, model, None);
    }

    let (w, h) = model.imgsz();
    let mut viewer = Viewer::new("Posture Monitor", w as usize, h as usize)?;
    let mut monitor = monitor.with_annotator(Annotator::new());
    let summary = monitor.run(frames, model, Some(&mut viewer))?;

    // Recorded sources end on their own, keep the last frame up until closed
    if summary.stop == StopReason::EndOfStream && !live {
        info!("End of stream, close the window or press Q to exit");
        viewer.hold(Duration::MAX);
    }
    Ok(summary)
}

#[cfg(not(feature = "visualize"))]
fn run_with_display(
    mut monitor: Monitor,
    frames: &mut dyn FrameSource,
    model: &mut YoloPoseModel,
    headless: bool,
    _live: bool,
) -> Result<RunSummary> {
    if !headless {
        warn!("Display requires the 'visualize' feature, running headless");
    }
    monitor.run(frames, model, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypoints::{Keypoint, Landmark};
    use std::collections::VecDeque;

    struct ScriptedFrames(VecDeque<Result<Option<DynamicImage>>>);

    impl FrameSource for ScriptedFrames {
        fn read(&mut self) -> Result<Option<DynamicImage>> {
            self.0.pop_front().unwrap_or(Ok(None))
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    struct FixedPose(Option<Pose>);

    impl PoseEstimator for FixedPose {
        fn estimate(&mut self, _image: &DynamicImage) -> Result<Option<Pose>> {
            Ok(self.0.clone())
        }
    }

    struct ScriptedKeys(VecDeque<Vec<KeyEvent>>, usize);

    impl FrameDisplay for ScriptedKeys {
        fn show(&mut self, _image: &DynamicImage) -> Result<Vec<KeyEvent>> {
            self.1 += 1;
            Ok(self.0.pop_front().unwrap_or_default())
        }
    }

    fn frame() -> Result<Option<DynamicImage>> {
        Ok(Some(DynamicImage::new_rgb8(8, 8)))
    }

    fn slouched() -> Pose {
        Pose::default()
            .with(Landmark::LeftShoulder, Keypoint::new(0.4, 0.6, 0.9))
            .with(Landmark::RightShoulder, Keypoint::new(0.6, 0.6, 0.9))
            .with(Landmark::LeftEar, Keypoint::new(0.42, 0.59, 0.9))
            .with(Landmark::Nose, Keypoint::new(0.5, 0.55, 0.9))
    }

    #[test]
    fn test_runs_until_end_of_stream() {
        let mut frames = ScriptedFrames(VecDeque::from([frame(), frame(), frame()]));
        let mut estimator = FixedPose(Some(slouched()));
        let mut monitor = Monitor::new(&MonitorConfig::default(), None);

        let summary = monitor.run(&mut frames, &mut estimator, None).unwrap();
        assert_eq!(summary.stop, StopReason::EndOfStream);
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.detections, 3);
        assert_eq!(summary.alert_frames, 3);
        // Frames arrive well within the cooldown
        assert_eq!(summary.alerts_fired, 1);
    }

    #[test]
    fn test_quit_key_stops_loop() {
        let mut frames = ScriptedFrames(VecDeque::from([frame(), frame(), frame()]));
        let mut estimator = FixedPose(None);
        let mut display = ScriptedKeys(VecDeque::from([vec![], vec![KeyEvent::Quit]]), 0);
        let mut monitor = Monitor::new(&MonitorConfig::default(), None);

        let summary = monitor
            .run(&mut frames, &mut estimator, Some(&mut display))
            .unwrap();
        assert_eq!(summary.stop, StopReason::Quit);
        assert_eq!(summary.frames, 2);
        assert_eq!(display.1, 2);
        assert_eq!(summary.detections, 0);
    }

    #[test]
    fn test_save_key_sets_reference() {
        let mut frames = ScriptedFrames(VecDeque::from([frame(), frame()]));
        let mut estimator = FixedPose(Some(slouched()));
        let mut display = ScriptedKeys(VecDeque::from([vec![KeyEvent::SaveReference]]), 0);
        let mut monitor = Monitor::new(&MonitorConfig::default(), None);

        monitor
            .run(&mut frames, &mut estimator, Some(&mut display))
            .unwrap();
        assert!(monitor.session().reference().is_some());
    }

    #[test]
    fn test_capture_failures_are_skipped_then_fatal() {
        let failure = || Err(MonitorError::CaptureError("no frame".to_string()));
        let config = MonitorConfig::default().with_max_capture_failures(3);

        let mut frames = ScriptedFrames(VecDeque::from([failure(), failure(), frame()]));
        let mut monitor = Monitor::new(&config, None);
        let summary = monitor
            .run(&mut frames, &mut FixedPose(None), None)
            .unwrap();
        assert_eq!(summary.frames, 1);

        let mut frames = ScriptedFrames(VecDeque::from([failure(), failure(), failure(), frame()]));
        let mut monitor = Monitor::new(&config, None);
        let result = monitor.run(&mut frames, &mut FixedPose(None), None);
        assert!(matches!(result, Err(MonitorError::CaptureError(_))));
    }

    #[test]
    fn test_headless_camera_is_rejected() {
        use crate::cli::args::{Cli, Commands};
        use clap::Parser;

        let Commands::Run(args) = Cli::parse_from(["app", "run", "--source", "0", "--headless"]).command;
        assert!(matches!(run_monitor(&args), Err(MonitorError::ConfigError(_))));
    }
}
