// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Per-run monitoring state.
//!
//! [`MonitorSession`] owns everything that changes from frame to frame: the
//! smoothing windows, the evaluator with its optional reference posture, the alert
//! dispatcher and the transient status line shown after a key command. The run
//! loop feeds it one detection result per frame and forwards key events to it.

use std::time::{Duration, Instant};

use crate::alert::{AlertDispatcher, AlertSound};
use crate::config::MonitorConfig;
use crate::evaluator::{PostureEvaluator, ReferencePosture, Thresholds, Verdict};
use crate::keypoints::Pose;
use crate::metrics::PostureMetrics;
use crate::smoothing::{MetricSmoother, SmoothedMetrics};
use crate::visualizer::KeyEvent;

/// How long a status message stays on screen.
pub const STATUS_DURATION: Duration = Duration::from_secs(3);

/// What was seen in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Detection {
    /// No person in the frame. Nothing was evaluated.
    Absent,
    /// A person was found and evaluated.
    Present {
        /// Raw metrics of this frame.
        metrics: PostureMetrics,
        /// Metrics after smoothing.
        smoothed: SmoothedMetrics,
        /// Evaluation of the smoothed metrics.
        verdict: Verdict,
    },
}

/// Outcome of processing one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// Detection and evaluation result.
    pub detection: Detection,
    /// Whether the alert fired on this frame.
    pub alert_fired: bool,
}

impl FrameReport {
    /// The verdict, if a person was evaluated.
    #[must_use]
    pub const fn verdict(&self) -> Option<Verdict> {
        match self.detection {
            Detection::Absent => None,
            Detection::Present { verdict, .. } => Some(verdict),
        }
    }
}

/// What the run loop should do after a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Keep going.
    Continue,
    /// Stop monitoring.
    Quit,
}

#[derive(Debug, Clone)]
struct StatusMessage {
    text: String,
    expires: Instant,
}

/// Mutable state of a monitoring run.
#[derive(Debug)]
pub struct MonitorSession {
    smoother: MetricSmoother,
    evaluator: PostureEvaluator,
    dispatcher: AlertDispatcher,
    status: Option<StatusMessage>,
    frames: usize,
    detections: usize,
    alert_frames: usize,
}

impl MonitorSession {
    /// Create a session from the configuration. `sound` may be `None` for silent
    /// alerts.
    #[must_use]
    pub fn new(config: &MonitorConfig, sound: Option<Box<dyn AlertSound>>) -> Self {
        Self {
            smoother: MetricSmoother::new(config.window_size),
            evaluator: PostureEvaluator::new(Thresholds::from(config)),
            dispatcher: AlertDispatcher::new(sound, config.alert_cooldown),
            status: None,
            frames: 0,
            detections: 0,
            alert_frames: 0,
        }
    }

    /// Process the detection result of one frame observed at `now`.
    ///
    /// Without a pose nothing is evaluated or dispatched and the smoothing windows
    /// are left as they are.
    pub fn process(&mut self, pose: Option<&Pose>, now: Instant) -> FrameReport {
        self.frames += 1;

        let Some(pose) = pose else {
            return FrameReport {
                detection: Detection::Absent,
                alert_fired: false,
            };
        };
        self.detections += 1;

        let metrics = PostureMetrics::from_pose(pose);
        let smoothed = self.smoother.update(&metrics);
        let verdict = self.evaluator.evaluate(&smoothed);
        if verdict.is_alert() {
            self.alert_frames += 1;
        }
        let alert_fired = self.dispatcher.dispatch(&verdict, now);

        FrameReport {
            detection: Detection::Present {
                metrics,
                smoothed,
                verdict,
            },
            alert_fired,
        }
    }

    /// Apply a key command.
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Control {
        match key {
            KeyEvent::Quit => return Control::Quit,
            KeyEvent::SaveReference => {
                self.save_reference(now);
            }
            KeyEvent::ResetReference => {
                self.reset_reference(now);
            }
        }
        Control::Continue
    }

    /// Save the current smoothed metrics as the reference posture.
    ///
    /// Returns `None` and leaves any previous reference in place if no metrics
    /// have been collected yet.
    pub fn save_reference(&mut self, now: Instant) -> Option<ReferencePosture> {
        let Some(current) = self.smoother.current() else {
            self.set_status("No posture to save yet", now);
            return None;
        };
        let reference = self.evaluator.set_reference(&current);
        self.set_status(
            format!(
                "Reference saved (d={:.2}, a={:.1})",
                reference.target_distance, reference.target_angle
            ),
            now,
        );
        Some(reference)
    }

    /// Clear the reference posture. Returns the cleared reference, `None` if none
    /// was set.
    pub fn reset_reference(&mut self, now: Instant) -> Option<ReferencePosture> {
        let cleared = self.evaluator.clear_reference();
        if cleared.is_some() {
            self.set_status("Reference reset, using fixed thresholds", now);
        }
        cleared
    }

    fn set_status(&mut self, text: impl Into<String>, now: Instant) {
        self.status = Some(StatusMessage {
            text: text.into(),
            expires: now + STATUS_DURATION,
        });
    }

    /// The status message to show at `now`, if it has not expired.
    #[must_use]
    pub fn status(&self, now: Instant) -> Option<&str> {
        self.status
            .as_ref()
            .filter(|s| now < s.expires)
            .map(|s| s.text.as_str())
    }

    /// The current reference posture.
    #[must_use]
    pub const fn reference(&self) -> Option<ReferencePosture> {
        self.evaluator.reference()
    }

    /// The latest smoothed metrics.
    #[must_use]
    pub const fn smoothed(&self) -> Option<SmoothedMetrics> {
        self.smoother.current()
    }

    /// The alert dispatcher.
    #[must_use]
    pub const fn dispatcher(&self) -> &AlertDispatcher {
        &self.dispatcher
    }

    /// Frames processed.
    #[must_use]
    pub const fn frames(&self) -> usize {
        self.frames
    }

    /// Frames in which a person was detected.
    #[must_use]
    pub const fn detections(&self) -> usize {
        self.detections
    }

    /// Frames whose verdict was an alert, whether or not the alert fired.
    #[must_use]
    pub const fn alert_frames(&self) -> usize {
        self.alert_frames
    }
}
