//! Timer engine: the single owner of every timer and of the update loop's
//! scheduling state.
//!
//! All operations are synchronous and take one clock sample per call, so every
//! timer touched by a batch operation shares the same timestamp and counts down
//! in lockstep with the others.

use std::{fmt, sync::Arc, time::Duration};

use tracing::{debug, info};

use super::{
    clock::Clock,
    time_format::{parse_lenient, parse_mmss, sanitize_field, validate_parts},
    timer::{EditField, EditSession, Timer, TimerId, TimerStatus},
};
use crate::error::ValidationError;

/// Period of the update loop
pub const TICK_PERIOD_MS: u64 = 1_000;

/// Shown next to the edit inputs when a save is rejected
pub const EDIT_ERROR_MESSAGE: &str = "Invalid time format. Use MM:SS format.";

/// Receives every timer that completed during one update pass
pub type CompletionCallback = Box<dyn FnMut(&[Timer]) + Send>;

/// Delay until the next whole-period boundary measured from `loop_started_at_ms`.
///
/// A wake-up that lands exactly on a boundary waits a full period so the loop
/// never spins.
pub fn aligned_delay(loop_started_at_ms: u64, now_ms: u64) -> Duration {
    let elapsed = now_ms.saturating_sub(loop_started_at_ms);
    let next_boundary = elapsed.div_ceil(TICK_PERIOD_MS) * TICK_PERIOD_MS;
    match next_boundary - elapsed {
        0 => Duration::from_millis(TICK_PERIOD_MS),
        delay => Duration::from_millis(delay),
    }
}

/// Outcome of the aggregate pause/resume toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchAction {
    Paused(usize),
    Started(usize),
}

/// Outcome of typing into one of the edit inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditInput {
    Pending,
    AdvanceToSeconds,
    Saved,
    Rejected(ValidationError),
}

pub struct TimerEngine {
    timers: Vec<Timer>,
    clock: Arc<dyn Clock>,
    next_id: u64,
    /// Reference instant the update loop aligns to, `None` while stopped
    loop_started_at_ms: Option<u64>,
    on_completion: Option<CompletionCallback>,
}

impl fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerEngine")
            .field("timers", &self.timers)
            .field("next_id", &self.next_id)
            .field("loop_started_at_ms", &self.loop_started_at_ms)
            .field("has_completion_callback", &self.on_completion.is_some())
            .finish()
    }
}

impl TimerEngine {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            timers: Vec::new(),
            clock,
            next_id: 1,
            loop_started_at_ms: None,
            on_completion: None,
        }
    }

    /// Install the completion callback, replacing any previous one
    pub fn set_completion_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&[Timer]) + Send + 'static,
    {
        self.on_completion = Some(Box::new(callback));
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn timers(&self) -> &[Timer] {
        &self.timers
    }

    pub fn get(&self, id: TimerId) -> Option<&Timer> {
        self.timers.iter().find(|t| t.id == id)
    }

    fn find_mut(&mut self, id: TimerId) -> Option<&mut Timer> {
        self.timers.iter_mut().find(|t| t.id == id)
    }

    fn push_timer(&mut self, duration_seconds: u32) -> Timer {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let timer = Timer::new(id, duration_seconds);
        self.timers.push(timer.clone());
        timer
    }

    /// Create a ready timer from a minutes/seconds pair
    pub fn create(&mut self, minutes: i64, seconds: i64) -> Result<Timer, ValidationError> {
        let duration = validate_parts(minutes, seconds)?;
        let timer = self.push_timer(duration);
        info!("Added timer {}: {}", timer.id, timer.display());
        Ok(timer)
    }

    /// Append one ready timer per duration and arm the update loop
    pub fn add_batch(&mut self, durations_seconds: &[u32]) -> Vec<Timer> {
        let created: Vec<Timer> = durations_seconds
            .iter()
            .map(|&duration| self.push_timer(duration))
            .collect();
        let now = self.clock.now_ms();
        self.arm_loop(now);
        info!("Added {} quick timers", created.len());
        created
    }

    /// Start every ready and paused timer (and completed ones when asked)
    /// against one shared timestamp. Paused timers resume in place.
    pub fn start_all(&mut self, include_completed: bool) -> usize {
        let now = self.clock.now_ms();
        let mut started = 0;

        for timer in &mut self.timers {
            match timer.status {
                TimerStatus::Ready => timer.start_fresh(now),
                TimerStatus::Completed if include_completed => timer.start_fresh(now),
                TimerStatus::Paused => timer.resume(now),
                _ => continue,
            }
            started += 1;
        }

        if started > 0 {
            self.arm_loop(now);
            info!("Started {} timer(s)", started);
        }
        started
    }

    /// Pause every running timer
    pub fn pause_all(&mut self) -> usize {
        let now = self.clock.now_ms();
        // Freeze values that are current as of `now`, completing any timer
        // that ran out since the last pass.
        self.update_at(now);

        let mut paused = 0;
        for timer in self.timers.iter_mut().filter(|t| t.is_running()) {
            timer.pause(now);
            paused += 1;
        }

        if paused > 0 {
            info!("Paused {} timer(s)", paused);
        }
        paused
    }

    /// Pause everything if anything runs; otherwise start, resuming paused
    /// timers without restarting completed ones when any are paused.
    pub fn toggle_all(&mut self) -> BatchAction {
        if self.has_running() {
            BatchAction::Paused(self.pause_all())
        } else {
            let include_completed = !self.any_paused();
            BatchAction::Started(self.start_all(include_completed))
        }
    }

    /// Start, pause, resume or restart a single timer. Returns the new status,
    /// or `None` when the id is unknown.
    pub fn toggle(&mut self, id: TimerId) -> Option<TimerStatus> {
        let now = self.clock.now_ms();
        let status = self.get(id)?.status;

        if status == TimerStatus::Running {
            self.update_at(now);
        }

        let timer = self.find_mut(id)?;
        // Ran out before this pause landed; report the completion instead of restarting
        if status == TimerStatus::Running && timer.status == TimerStatus::Completed {
            debug!("Timer {} completed before it could be paused", id);
            return Some(TimerStatus::Completed);
        }
        match timer.status {
            TimerStatus::Running => {
                timer.pause(now);
                info!("Paused timer {}", id);
            }
            TimerStatus::Ready | TimerStatus::Completed => {
                let restarted = timer.status == TimerStatus::Completed;
                timer.start_fresh(now);
                if restarted {
                    info!("Restarted timer {}", id);
                } else {
                    info!("Started timer {}", id);
                }
            }
            TimerStatus::Paused => {
                timer.resume(now);
                info!("Resumed timer {}", id);
            }
        }

        let status = timer.status;
        if status == TimerStatus::Running {
            self.arm_loop(now);
        }
        Some(status)
    }

    pub fn remove(&mut self, id: TimerId) -> bool {
        let Some(index) = self.timers.iter().position(|t| t.id == id) else {
            return false;
        };
        self.timers.remove(index);
        info!("Removed timer {}", id);
        true
    }

    /// Return every timer to ready at its full duration and stop the loop
    pub fn reset_all(&mut self) {
        for timer in &mut self.timers {
            timer.reset();
        }
        self.stop_loop();
        info!("Reset all timers");
    }

    /// Recompute every running timer. Timers that reach zero are marked
    /// completed and handed to the completion callback as a single batch.
    pub fn update(&mut self) -> Vec<Timer> {
        let now = self.clock.now_ms();
        self.update_at(now)
    }

    fn update_at(&mut self, now_ms: u64) -> Vec<Timer> {
        let completed: Vec<Timer> = self
            .timers
            .iter_mut()
            .filter_map(|timer| timer.recompute(now_ms).then(|| timer.clone()))
            .collect();

        if !completed.is_empty() {
            info!("{} timer(s) completed", completed.len());
            if let Some(callback) = self.on_completion.as_mut() {
                callback(&completed);
            }
        }
        completed
    }

    /// Open the duration editor. A running timer is paused first so no time
    /// is lost while the editor is open.
    pub fn start_edit(&mut self, id: TimerId, focus: EditField) -> bool {
        let now = self.clock.now_ms();
        let Some(status) = self.get(id).map(|t| t.status) else {
            return false;
        };
        if status == TimerStatus::Running {
            self.update_at(now);
        }

        let Some(timer) = self.find_mut(id) else {
            return false;
        };
        let pausing = timer.is_running();
        timer.pause(now);
        let already_paused_by_edit = timer.edit.as_ref().is_some_and(|e| e.paused_by_edit);
        timer.edit = Some(EditSession::seeded(
            timer.duration_seconds,
            focus,
            pausing || already_paused_by_edit,
        ));
        debug!("Editing timer {} (paused by edit: {})", id, pausing);
        true
    }

    /// Store typed input for one edit field. A full minutes entry moves focus
    /// to seconds; a full seconds entry saves.
    pub fn input_edit_field(&mut self, id: TimerId, field: EditField, raw: &str) -> Option<EditInput> {
        let value = sanitize_field(raw);
        let complete = value.len() == 2;

        let session = self.find_mut(id)?.edit.as_mut()?;
        match field {
            EditField::Minutes => {
                session.minutes = value;
                if !complete {
                    return Some(EditInput::Pending);
                }
                session.focus = EditField::Seconds;
                Some(EditInput::AdvanceToSeconds)
            }
            EditField::Seconds => {
                session.seconds = value;
                session.focus = EditField::Seconds;
                if !complete {
                    return Some(EditInput::Pending);
                }
                match self.save_edit(id) {
                    Ok(_) => Some(EditInput::Saved),
                    Err(err) => Some(EditInput::Rejected(err)),
                }
            }
        }
    }

    /// Leave the editor without applying changes. A timer the editor paused
    /// runs again from now; the time spent editing is not charged.
    pub fn cancel_edit(&mut self, id: TimerId) -> bool {
        let now = self.clock.now_ms();
        let Some(timer) = self.find_mut(id) else {
            return false;
        };
        let Some(session) = timer.edit.take() else {
            return false;
        };

        let restore = session.paused_by_edit && timer.status == TimerStatus::Paused;
        if restore {
            timer.resume(now);
            self.arm_loop(now);
        }
        debug!("Cancelled edit of timer {} (restored: {})", id, restore);
        true
    }

    /// Apply the pending MM:SS edit. On rejection the error is recorded on the
    /// edit session and the timer stays in edit mode untouched. Returns
    /// `Ok(false)` when the id is unknown or not being edited.
    pub fn save_edit(&mut self, id: TimerId) -> Result<bool, ValidationError> {
        let now = self.clock.now_ms();
        let others_running = self.timers.iter().any(|t| t.id != id && t.is_running());

        let Some(timer) = self.find_mut(id) else {
            return Ok(false);
        };
        let Some(session) = timer.edit.as_mut() else {
            return Ok(false);
        };

        let minutes = parse_lenient(&session.minutes);
        let seconds = parse_lenient(&session.seconds);
        let duration = match parse_mmss(&format!("{minutes:02}:{seconds:02}")) {
            Ok(duration) => duration,
            Err(err) => {
                session.error = Some(EDIT_ERROR_MESSAGE.to_string());
                debug!("Rejected edit of timer {}: {}", id, err);
                return Err(err);
            }
        };

        let run = session.paused_by_edit || others_running;
        timer.edit = None;
        timer.duration_seconds = duration;
        if run {
            timer.start_fresh(now);
        } else {
            timer.reset();
        }
        info!("Timer {} set to {}", id, timer.display());

        if run {
            self.arm_loop(now);
        }
        Ok(true)
    }

    pub fn has_running(&self) -> bool {
        self.timers.iter().any(Timer::is_running)
    }

    pub fn any_paused(&self) -> bool {
        self.timers.iter().any(|t| t.status == TimerStatus::Paused)
    }

    pub fn can_start_all(&self) -> bool {
        self.timers.iter().any(|t| {
            matches!(
                t.status,
                TimerStatus::Ready | TimerStatus::Paused | TimerStatus::Completed
            )
        })
    }

    /// Label for the aggregate pause/resume control
    pub fn toggle_all_label(&self) -> &'static str {
        if self.has_running() {
            "Pause All"
        } else if self.any_paused() {
            "Resume All"
        } else {
            "Start All"
        }
    }

    pub fn loop_started_at_ms(&self) -> Option<u64> {
        self.loop_started_at_ms
    }

    pub fn is_loop_armed(&self) -> bool {
        self.loop_started_at_ms.is_some()
    }

    fn arm_loop(&mut self, now_ms: u64) {
        if self.loop_started_at_ms.is_none() {
            self.loop_started_at_ms = Some(now_ms);
            debug!("Update loop armed at {}", now_ms);
        }
    }

    pub fn stop_loop(&mut self) {
        if self.loop_started_at_ms.take().is_some() {
            debug!("Update loop stopped");
        }
    }

    /// Time until the loop should wake next, `None` while it is stopped
    pub fn next_tick_delay(&self) -> Option<Duration> {
        self.loop_started_at_ms
            .map(|started| aligned_delay(started, self.clock.now_ms()))
    }

    /// One loop iteration: update, then stop the loop when nothing runs
    pub fn tick(&mut self) -> Vec<Timer> {
        let completed = self.update();
        if !self.has_running() {
            self.stop_loop();
        }
        completed
    }
}
