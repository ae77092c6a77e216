// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

#![allow(clippy::multiple_crate_versions)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! # Posture Monitor
//!
//! Webcam posture monitoring built on [Ultralytics](https://ultralytics.com) YOLO pose
//! models. Each frame goes through the same pipeline:
//!
//! ```text
//! FrameSource -> PoseEstimator -> metrics -> MetricSmoother -> PostureEvaluator -> AlertDispatcher
//! ```
//!
//! Two signals are derived from the shoulders, the left ear and the nose:
//!
//! - **Relative distance** - vertical ear-to-shoulder distance divided by shoulder
//!   width. It drops when the head sinks forward.
//! - **Tilt angle** - angle between the shoulder-midpoint-to-nose vector and the
//!   vertical, in degrees.
//!
//! Both are averaged over a short window and checked against fixed thresholds, or
//! against a reference posture captured by the user (press `S` in the window).
//! Alerts are rate limited by a cooldown.
//!
//! ## Quick Start (Library)
//!
//! ```
//! use std::time::Instant;
//! use posture_monitor::{Keypoint, Landmark, MonitorConfig, MonitorSession, Pose};
//!
//! let mut session = MonitorSession::new(&MonitorConfig::default(), None);
//!
//! let pose = Pose::default()
//!     .with(Landmark::LeftShoulder, Keypoint::new(0.4, 0.6, 0.9))
//!     .with(Landmark::RightShoulder, Keypoint::new(0.6, 0.6, 0.9))
//!     .with(Landmark::LeftEar, Keypoint::new(0.42, 0.54, 0.9))
//!     .with(Landmark::Nose, Keypoint::new(0.5, 0.5, 0.9));
//!
//! let report = session.process(Some(&pose), Instant::now());
//! assert_eq!(report.verdict(), Some(posture_monitor::Verdict::Ok));
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! # Monitor the default webcam (downloads yolo11n-pose.onnx on first run)
//! posture-monitor run
//!
//! # Second camera, stricter angle, alert at most every 10 seconds
//! posture-monitor run --source 1 --max-angle 10 --cooldown 10
//!
//! # Replay a recording without a window
//! posture-monitor run --source session.mp4 --headless
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`keypoints`] | [`Keypoint`], [`Landmark`] and [`Pose`] |
//! | [`metrics`] | Posture metrics from keypoints |
//! | [`smoothing`] | Moving averages over recent frames |
//! | [`evaluator`] | Thresholds, reference posture and [`Verdict`]s |
//! | [`alert`] | Cooldown-limited [`AlertDispatcher`] |
//! | [`session`] | Per-run state ([`MonitorSession`]) |
//! | [`model`] | [`PoseEstimator`] trait and the ONNX [`YoloPoseModel`] |
//! | [`source`] | Webcam, video and image [`FrameSource`]s |
//! | [`config`] | [`MonitorConfig`] |
//! | [`error`] | Error types ([`MonitorError`], [`Result`]) |
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `annotate` | Overlay drawing |
//! | `visualize` | Monitor window with key input (default) |
//! | `audio` | Audible alerts (default) |
//! | `camera` | Webcam capture through OpenCV (default) |
//! | `video` | Video file replay |
//!
//! ## License
//!
//! This project is licensed under [AGPL-3.0](https://ultralytics.com/license).

// Modules
pub mod alert;
#[cfg(feature = "annotate")]
pub mod annotate;
pub mod audio;
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod evaluator;
pub mod keypoints;
pub mod metrics;
pub mod model;
pub mod postprocessing;
pub mod preprocessing;
pub mod session;
pub mod smoothing;
pub mod source;
pub mod visualizer;

// Re-export main types for convenience
pub use alert::{AlertDispatcher, AlertSound};
pub use config::MonitorConfig;
pub use error::{MonitorError, Result};
pub use evaluator::{AlertReason, HeadOffset, PostureEvaluator, ReferencePosture, Verdict};
pub use keypoints::{Keypoint, Landmark, Pose};
pub use metrics::{PostureMetrics, extract_metrics};
pub use model::{PoseEstimator, YoloPoseModel};
pub use session::{Control, Detection, FrameReport, MonitorSession};
pub use smoothing::{MetricSmoother, SmoothedMetrics};
pub use source::{FrameSource, Source};
pub use visualizer::{FrameDisplay, KeyEvent};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
