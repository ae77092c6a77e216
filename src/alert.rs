// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Rate-limited alert dispatch.

use std::time::{Duration, Instant};

use crate::evaluator::Verdict;

/// Something that can make an alert noise.
///
/// `play` must not block; a call while the previous sound is still playing may
/// restart or ignore it.
pub trait AlertSound {
    /// Start playback.
    fn play(&mut self);
}

/// Fires the alert sound at most once per cooldown interval.
///
/// The cooldown only advances when an alert actually fires; OK verdicts leave it
/// untouched, so a long stretch of bad posture re-alerts at the cooldown cadence.
pub struct AlertDispatcher {
    sound: Option<Box<dyn AlertSound>>,
    cooldown: Duration,
    last_alert: Option<Instant>,
    fired: usize,
}

impl AlertDispatcher {
    /// Create a dispatcher. Without a sound, alerts are tracked but silent.
    #[must_use]
    pub fn new(sound: Option<Box<dyn AlertSound>>, cooldown: Duration) -> Self {
        Self {
            sound,
            cooldown,
            last_alert: None,
            fired: 0,
        }
    }

    /// Handle a verdict observed at `now`. Returns `true` if an alert fired.
    pub fn dispatch(&mut self, verdict: &Verdict, now: Instant) -> bool {
        if !verdict.is_alert() {
            return false;
        }

        let ready = self
            .last_alert
            .is_none_or(|last| now.saturating_duration_since(last) >= self.cooldown);
        if !ready {
            return false;
        }

        if let Some(sound) = self.sound.as_mut() {
            sound.play();
        }
        self.last_alert = Some(now);
        self.fired += 1;
        true
    }

    /// Whether a sound is attached.
    #[must_use]
    pub const fn has_sound(&self) -> bool {
        self.sound.is_some()
    }

    /// When the last alert fired.
    #[must_use]
    pub const fn last_alert(&self) -> Option<Instant> {
        self.last_alert
    }

    /// Number of alerts fired so far.
    #[must_use]
    pub const fn fired(&self) -> usize {
        self.fired
    }
}

impl std::fmt::Debug for AlertDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertDispatcher")
            .field("has_sound", &self.has_sound())
            .field("cooldown", &self.cooldown)
            .field("last_alert", &self.last_alert)
            .field("fired", &self.fired)
            .finish()
    }
}
