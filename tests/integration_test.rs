// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Integration tests for the monitoring pipeline

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use posture_monitor::{
    AlertReason, AlertSound, Detection, FrameReport, HeadOffset, Keypoint, KeyEvent, Landmark,
    MonitorConfig, MonitorSession, Pose, Verdict,
};

struct CountingSound(Rc<Cell<usize>>);

impl AlertSound for CountingSound {
    fn play(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}

fn session_with_sound(config: &MonitorConfig) -> (MonitorSession, Rc<Cell<usize>>) {
    let plays = Rc::new(Cell::new(0));
    let sound = CountingSound(Rc::clone(&plays));
    (MonitorSession::new(config, Some(Box::new(sound))), plays)
}

/// A pose with shoulder width 0.2, the ear `ear_rise` above the left shoulder and
/// the nose straight above the shoulder midpoint.
fn pose(ear_rise: f32, visibility: f32) -> Pose {
    Pose::default()
        .with(Landmark::LeftShoulder, Keypoint::new(0.4, 0.6, visibility))
        .with(Landmark::RightShoulder, Keypoint::new(0.6, 0.6, visibility))
        .with(Landmark::LeftEar, Keypoint::new(0.42, 0.6 - ear_rise, 0.9))
        .with(Landmark::Nose, Keypoint::new(0.5, 0.45, 0.9))
}

fn verdict(report: &FrameReport) -> Verdict {
    report.verdict().expect("person should be detected")
}

#[test]
fn test_upright_posture_is_ok() {
    let (mut session, plays) = session_with_sound(&MonitorConfig::default());
    let now = Instant::now();

    // relative distance 0.06 / 0.2 = 0.3, angle 0
    let report = session.process(Some(&pose(0.06, 0.9)), now);
    assert_eq!(verdict(&report), Verdict::Ok);
    assert!(!report.alert_fired);
    assert_eq!(plays.get(), 0);

    let Detection::Present { metrics, smoothed, .. } = report.detection else {
        panic!("expected a detection");
    };
    assert!((metrics.relative_distance - 0.3).abs() < 1e-3);
    assert!(metrics.tilt_angle.abs() < 0.5);
    assert!((smoothed.distance - metrics.relative_distance).abs() < 1e-6);
}

#[test]
fn test_hidden_shoulder_alerts_even_when_calibrated() {
    let (mut session, plays) = session_with_sound(&MonitorConfig::default());
    let t0 = Instant::now();

    session.process(Some(&pose(0.06, 0.9)), t0);
    session.save_reference(t0);

    let report = session.process(Some(&pose(0.06, 0.3)), t0 + Duration::from_millis(40));
    assert_eq!(
        verdict(&report),
        Verdict::Alert(AlertReason::ShouldersNotVisible)
    );
    assert!(report.alert_fired);
    assert_eq!(plays.get(), 1);
}

#[test]
fn test_calibrated_head_too_low() {
    // Window of one so each frame is evaluated on its own
    let config = MonitorConfig::default().with_window_size(1);
    let (mut session, _) = session_with_sound(&config);
    let now = Instant::now();

    session.process(Some(&pose(0.06, 0.9)), now);
    let reference = session.save_reference(now).unwrap();
    assert!((reference.target_distance - 0.3).abs() < 1e-3);

    assert_eq!(
        verdict(&session.process(Some(&pose(0.06, 0.9)), now)),
        Verdict::Ok
    );

    // 0.03 / 0.2 = 0.15, more than 0.08 below the reference
    let report = session.process(Some(&pose(0.03, 0.9)), now);
    assert_eq!(
        verdict(&report),
        Verdict::Alert(AlertReason::OffReference {
            head: HeadOffset::TooLow,
            leaning: false,
        })
    );
    assert_eq!(verdict(&report).reason().unwrap().to_string(), "head too low");
}

#[test]
fn test_smoothing_delays_alert() {
    let (mut session, _) = session_with_sound(&MonitorConfig::default());
    let now = Instant::now();

    for _ in 0..5 {
        session.process(Some(&pose(0.06, 0.9)), now);
    }
    // A single slouched frame moves the mean from 0.3 to 0.25, still above 0.15
    let report = session.process(Some(&pose(0.01, 0.9)), now);
    assert_eq!(verdict(&report), Verdict::Ok);
}

#[test]
fn test_alert_cooldown_across_frames() {
    let config = MonitorConfig::default().with_window_size(1);
    let (mut session, plays) = session_with_sound(&config);
    let t0 = Instant::now();
    let slouched = pose(0.01, 0.9);

    assert!(session.process(Some(&slouched), t0).alert_fired);
    assert!(
        !session
            .process(Some(&slouched), t0 + Duration::from_secs(2))
            .alert_fired
    );
    assert_eq!(plays.get(), 1);

    assert!(
        session
            .process(Some(&slouched), t0 + Duration::from_secs(6))
            .alert_fired
    );
    assert_eq!(plays.get(), 2);
    assert_eq!(session.dispatcher().fired(), 2);
}

#[test]
fn test_absent_person_does_not_alert_or_reset() {
    let config = MonitorConfig::default().with_window_size(1);
    let (mut session, plays) = session_with_sound(&config);
    let t0 = Instant::now();

    session.process(Some(&pose(0.01, 0.9)), t0);
    let last_alert = session.dispatcher().last_alert();

    for i in 1..=10 {
        let report = session.process(None, t0 + Duration::from_secs(i));
        assert_eq!(report.detection, Detection::Absent);
        assert!(!report.alert_fired);
    }
    assert_eq!(plays.get(), 1);
    assert_eq!(session.dispatcher().last_alert(), last_alert);
    assert!(session.smoothed().is_some());
}

#[test]
fn test_reset_without_reference_is_noop() {
    let (mut session, _) = session_with_sound(&MonitorConfig::default());
    let now = Instant::now();

    assert!(session.reset_reference(now).is_none());
    assert!(session.reference().is_none());
    assert!(session.status(now).is_none());

    session.process(Some(&pose(0.06, 0.9)), now);
    session.handle_key(KeyEvent::SaveReference, now);
    session.handle_key(KeyEvent::ResetReference, now);
    assert!(session.reference().is_none());
    // Back on fixed thresholds
    assert_eq!(
        verdict(&session.process(Some(&pose(0.06, 0.9)), now)),
        Verdict::Ok
    );
}

#[test]
fn test_silent_session_reports_alerts() {
    let config = MonitorConfig::default().with_window_size(1);
    let mut session = MonitorSession::new(&config, None);
    let report = session.process(Some(&pose(0.01, 0.9)), Instant::now());
    assert_eq!(verdict(&report), Verdict::Alert(AlertReason::InadequatePosture));
    assert!(report.alert_fired);
    assert!(!session.dispatcher().has_sound());
}
