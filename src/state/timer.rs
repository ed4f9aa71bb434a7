//! Timer entity and its per-timer state transitions

use std::fmt;

use serde::{Deserialize, Serialize};

use super::time_format::format_time;

/// Opaque timer identifier, stable for the lifetime of the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerId(pub u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    Ready,
    Running,
    Paused,
    Completed,
}

impl TimerStatus {
    /// Label for the per-timer start/pause button
    pub fn action_label(self) -> &'static str {
        match self {
            TimerStatus::Ready => "Start",
            TimerStatus::Running => "Pause",
            TimerStatus::Paused => "Resume",
            TimerStatus::Completed => "Restart",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditField {
    #[default]
    Minutes,
    Seconds,
}

/// Transient state of an in-progress duration edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditSession {
    pub focus: EditField,
    pub minutes: String,
    pub seconds: String,
    pub error: Option<String>,
    /// Set when opening the editor paused a running timer
    pub paused_by_edit: bool,
}

impl EditSession {
    pub fn seeded(duration_seconds: u32, focus: EditField, paused_by_edit: bool) -> Self {
        let formatted = format_time(f64::from(duration_seconds));
        let (minutes, seconds) = formatted.split_once(':').unwrap_or(("00", "00"));
        Self {
            focus,
            minutes: minutes.to_string(),
            seconds: seconds.to_string(),
            error: None,
            paused_by_edit,
        }
    }
}

/// One countdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timer {
    pub id: TimerId,
    pub duration_seconds: u32,
    pub remaining_seconds: f64,
    pub status: TimerStatus,
    pub started_at_ms: Option<u64>,
    /// Seconds consumed by earlier running segments since the last full reset
    pub accumulated_seconds: f64,
    pub edit: Option<EditSession>,
}

impl Timer {
    pub fn new(id: TimerId, duration_seconds: u32) -> Self {
        Self {
            id,
            duration_seconds,
            remaining_seconds: f64::from(duration_seconds),
            status: TimerStatus::Ready,
            started_at_ms: None,
            accumulated_seconds: 0.0,
            edit: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    pub fn is_editing(&self) -> bool {
        self.edit.is_some()
    }

    /// Seconds of the current running segment, zero when not running
    pub fn segment_seconds(&self, now_ms: u64) -> f64 {
        match (self.status, self.started_at_ms) {
            (TimerStatus::Running, Some(started)) => now_ms.saturating_sub(started) as f64 / 1000.0,
            _ => 0.0,
        }
    }

    /// Run from the full duration with nothing accumulated
    pub fn start_fresh(&mut self, now_ms: u64) {
        self.status = TimerStatus::Running;
        self.started_at_ms = Some(now_ms);
        self.accumulated_seconds = 0.0;
        self.remaining_seconds = f64::from(self.duration_seconds);
    }

    /// Run again, keeping the time already consumed
    pub fn resume(&mut self, now_ms: u64) {
        self.status = TimerStatus::Running;
        self.started_at_ms = Some(now_ms);
    }

    /// Fold the current segment into the accumulator and freeze. No-op unless running.
    pub fn pause(&mut self, now_ms: u64) {
        if !self.is_running() {
            return;
        }
        self.accumulated_seconds += self.segment_seconds(now_ms);
        self.status = TimerStatus::Paused;
        self.remaining_seconds = self.remaining_at(0.0);
    }

    pub fn reset(&mut self) {
        self.status = TimerStatus::Ready;
        self.remaining_seconds = f64::from(self.duration_seconds);
        self.started_at_ms = None;
        self.accumulated_seconds = 0.0;
    }

    /// Recompute remaining time of a running timer. Returns true when this
    /// call moved it to `Completed`.
    pub fn recompute(&mut self, now_ms: u64) -> bool {
        if !self.is_running() {
            return false;
        }
        self.remaining_seconds = self.remaining_at(self.segment_seconds(now_ms));
        if self.remaining_seconds <= 0.0 {
            self.remaining_seconds = 0.0;
            self.status = TimerStatus::Completed;
            return true;
        }
        false
    }

    fn remaining_at(&self, segment_seconds: f64) -> f64 {
        (f64::from(self.duration_seconds) - segment_seconds - self.accumulated_seconds)
            .clamp(0.0, f64::from(self.duration_seconds))
    }

    pub fn display(&self) -> String {
        format_time(self.remaining_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_timer_is_ready_with_full_remaining() {
        let timer = Timer::new(TimerId(1), 90);
        assert_eq!(timer.status, TimerStatus::Ready);
        assert_eq!(timer.remaining_seconds, 90.0);
        assert_eq!(timer.started_at_ms, None);
        assert_eq!(timer.display(), "01:30");
    }

    #[test]
    fn pause_accumulates_running_segments() {
        let mut timer = Timer::new(TimerId(1), 60);
        timer.start_fresh(0);
        timer.pause(2_500);
        assert_eq!(timer.accumulated_seconds, 2.5);
        assert_eq!(timer.remaining_seconds, 57.5);

        timer.resume(10_000);
        timer.pause(11_000);
        assert_eq!(timer.accumulated_seconds, 3.5);
        assert_eq!(timer.remaining_seconds, 56.5);

        // already paused
        timer.pause(50_000);
        assert_eq!(timer.accumulated_seconds, 3.5);
    }

    #[test]
    fn recompute_completes_exactly_once() {
        let mut timer = Timer::new(TimerId(1), 2);
        timer.start_fresh(0);
        assert!(!timer.recompute(1_000));
        assert_eq!(timer.remaining_seconds, 1.0);
        assert!(timer.recompute(2_000));
        assert_eq!(timer.status, TimerStatus::Completed);
        assert_eq!(timer.remaining_seconds, 0.0);
        assert!(!timer.recompute(3_000));
    }

    #[test]
    fn clock_stepping_backwards_never_overfills() {
        let mut timer = Timer::new(TimerId(1), 10);
        timer.start_fresh(5_000);
        timer.recompute(1_000);
        assert_eq!(timer.remaining_seconds, 10.0);
    }

    #[test]
    fn edit_session_is_seeded_from_duration() {
        let session = EditSession::seeded(330, EditField::Seconds, true);
        assert_eq!(session.minutes, "05");
        assert_eq!(session.seconds, "30");
        assert_eq!(session.focus, EditField::Seconds);
        assert!(session.paused_by_edit);
    }

    #[test]
    fn action_labels() {
        assert_eq!(TimerStatus::Ready.action_label(), "Start");
        assert_eq!(TimerStatus::Running.action_label(), "Pause");
        assert_eq!(TimerStatus::Paused.action_label(), "Resume");
        assert_eq!(TimerStatus::Completed.action_label(), "Restart");
    }
}
