//! Main application state management

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::{Duration, Instant},
};
use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, trace, warn};

use super::{
    clock::Clock,
    engine::{BatchAction, EditInput, TimerEngine},
    settings::Settings,
    timer::{EditField, Timer, TimerId, TimerStatus},
};
use crate::{
    alerts::{build_output, ActiveTimers, AlertOutput, AlertScheduler, AudioDevice, Cue, OutputKind, UiEvent},
    error::{AppError, AudioError, ValidationError},
};

/// Owns the timer engine, the settings and the alert schedulers, and wires
/// them together. Handed to the HTTP layer and the background tasks.
#[derive(Debug)]
pub struct AppState {
    pub engine: Arc<Mutex<TimerEngine>>,
    pub settings: Arc<Mutex<Settings>>,
    /// Shared audio output
    pub device: Arc<AudioDevice>,
    /// Metronome clicks plus one-shot completion alerts
    pub alerts: AlertScheduler,
    /// Unconditional test clicks
    pub audio_test: AlertScheduler,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
    /// Completions and alert cues for the UI
    pub events_tx: broadcast::Sender<UiEvent>,
    /// Reference instant of the update loop, `None` while it is stopped
    pub loop_tx: watch::Sender<Option<u64>>,
    /// Keep the receiver alive to prevent channel closure
    pub _loop_rx: watch::Receiver<Option<u64>>,
    user_interacted: AtomicBool,
}

impl AppState {
    /// Create an AppState that forwards alerts over the UI event stream
    pub fn new(port: u16, host: String, settings: Settings, clock: Arc<dyn Clock>) -> Self {
        Self::with_output(port, host, settings, clock, |events_tx| {
            build_output(OutputKind::Events, events_tx)
        })
    }

    /// Create an AppState with a custom alert output. The factory receives
    /// the UI event sender.
    pub fn with_output<F>(
        port: u16,
        host: String,
        settings: Settings,
        clock: Arc<dyn Clock>,
        make_output: F,
    ) -> Self
    where
        F: FnOnce(broadcast::Sender<UiEvent>) -> Box<dyn AlertOutput>,
    {
        let (events_tx, _) = broadcast::channel(100);
        let (loop_tx, loop_rx) = watch::channel(None);

        let mut engine = TimerEngine::new(clock);
        let completion_tx = events_tx.clone();
        engine.set_completion_callback(move |timers| {
            let event = UiEvent::Completed {
                timers: timers.iter().map(|t| t.id).collect(),
            };
            if completion_tx.send(event).is_err() {
                trace!("No subscribers for completion event");
            }
        });

        let device = Arc::new(AudioDevice::new(make_output(events_tx.clone())));

        Self {
            engine: Arc::new(Mutex::new(engine)),
            settings: Arc::new(Mutex::new(settings)),
            alerts: AlertScheduler::new("metronome", Arc::clone(&device)),
            audio_test: AlertScheduler::new("audio testing", Arc::clone(&device)),
            device,
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
            events_tx,
            loop_tx,
            _loop_rx: loop_rx,
            user_interacted: AtomicBool::new(false),
        }
    }

    /// Apply a mutation to the engine and publish the resulting loop state
    fn with_engine<R, F>(&self, updater: F) -> Result<R, AppError>
    where
        F: FnOnce(&mut TimerEngine) -> R,
    {
        let mut engine = self.engine.lock().map_err(|_| AppError::Lock("timer engine"))?;
        let result = updater(&mut engine);
        let loop_started_at = engine.loop_started_at_ms();
        drop(engine); // Release the lock early

        self.loop_tx.send_if_modified(|current| {
            if *current == loop_started_at {
                return false;
            }
            *current = loop_started_at;
            true
        });
        Ok(result)
    }

    fn read_engine<R, F>(&self, reader: F) -> Result<R, AppError>
    where
        F: FnOnce(&TimerEngine) -> R,
    {
        let engine = self.engine.lock().map_err(|_| AppError::Lock("timer engine"))?;
        Ok(reader(&engine))
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Current timers in insertion order
    pub fn timers(&self) -> Result<Vec<Timer>, AppError> {
        self.read_engine(|engine| engine.timers().to_vec())
    }

    pub fn has_running(&self) -> Result<bool, AppError> {
        self.read_engine(TimerEngine::has_running)
    }

    /// Create a timer, starting it right away when auto-start is on
    pub fn add_timer(&self, minutes: i64, seconds: i64) -> Result<Timer, AppError> {
        let auto_start = self.get_settings()?.auto_start_new_timers;
        let timer = self.with_engine(|engine: &mut TimerEngine| -> Result<Timer, ValidationError> {
            let timer = engine.create(minutes, seconds)?;
            if !auto_start {
                return Ok(timer);
            }
            engine.toggle(timer.id);
            info!("Auto-started timer {}", timer.id);
            Ok(engine.get(timer.id).cloned().unwrap_or(timer))
        })??;
        self.record_action("add");

        if timer.is_running() {
            self.on_timers_started();
        } else {
            self.note_user_interaction();
        }
        Ok(timer)
    }

    /// Add timers with pre-validated durations in seconds
    pub fn add_batch(&self, durations: &[i64]) -> Result<Vec<Timer>, AppError> {
        let durations = durations
            .iter()
            .map(|&d| {
                if d < 0 {
                    return Err(ValidationError::NegativeDuration(d));
                }
                u32::try_from(d).map_err(|_| ValidationError::DurationTooLong(d))
            })
            .collect::<Result<Vec<u32>, _>>()?;

        let timers = self.with_engine(|engine| engine.add_batch(&durations))?;
        self.record_action("add-batch");
        Ok(timers)
    }

    pub fn start_all(&self, include_completed: bool) -> Result<usize, AppError> {
        let started = self.with_engine(|engine| engine.start_all(include_completed))?;
        self.record_action("start-all");
        if started > 0 {
            self.on_timers_started();
        }
        Ok(started)
    }

    pub fn pause_all(&self) -> Result<usize, AppError> {
        let paused = self.with_engine(TimerEngine::pause_all)?;
        self.record_action("pause-all");
        Ok(paused)
    }

    pub fn toggle_all(&self) -> Result<BatchAction, AppError> {
        let action = self.with_engine(TimerEngine::toggle_all)?;
        self.record_action("toggle-all");
        if let BatchAction::Started(n) = action {
            if n > 0 {
                self.on_timers_started();
            }
        }
        Ok(action)
    }

    pub fn toggle(&self, id: TimerId) -> Result<Option<TimerStatus>, AppError> {
        let status = self.with_engine(|engine| engine.toggle(id))?;
        self.record_action("toggle");
        if status == Some(TimerStatus::Running) {
            self.on_timers_started();
        }
        Ok(status)
    }

    pub fn remove(&self, id: TimerId) -> Result<bool, AppError> {
        let removed = self.with_engine(|engine| engine.remove(id))?;
        self.record_action("remove");
        Ok(removed)
    }

    pub fn reset_all(&self) -> Result<(), AppError> {
        self.with_engine(TimerEngine::reset_all)?;
        self.record_action("reset-all");
        Ok(())
    }

    pub fn start_edit(&self, id: TimerId, focus: EditField) -> Result<bool, AppError> {
        let editing = self.with_engine(|engine| engine.start_edit(id, focus))?;
        self.record_action("edit");
        Ok(editing)
    }

    pub fn input_edit_field(
        &self,
        id: TimerId,
        field: EditField,
        raw: &str,
    ) -> Result<Option<EditInput>, AppError> {
        let outcome = self.with_engine(|engine| engine.input_edit_field(id, field, raw))?;
        if outcome == Some(EditInput::Saved) {
            self.record_action("save-edit");
        }
        Ok(outcome)
    }

    pub fn cancel_edit(&self, id: TimerId) -> Result<bool, AppError> {
        let cancelled = self.with_engine(|engine| engine.cancel_edit(id))?;
        self.record_action("cancel-edit");
        Ok(cancelled)
    }

    pub fn save_edit(&self, id: TimerId) -> Result<bool, AppError> {
        let saved = self.with_engine(|engine| engine.save_edit(id))??;
        self.record_action("save-edit");
        Ok(saved)
    }

    /// One iteration of the update loop
    pub fn run_update_pass(&self) -> Result<Vec<Timer>, AppError> {
        self.with_engine(TimerEngine::tick)
    }

    pub fn next_tick_delay(&self) -> Result<Option<Duration>, AppError> {
        self.read_engine(TimerEngine::next_tick_delay)
    }

    pub fn get_settings(&self) -> Result<Settings, AppError> {
        self.settings
            .lock()
            .map(|settings| *settings)
            .map_err(|_| AppError::Lock("settings"))
    }

    fn set_flag<F>(&self, update: F)
    where
        F: FnOnce(&mut Settings),
    {
        match self.settings.lock() {
            Ok(mut settings) => update(&mut settings),
            Err(e) => warn!("Failed to lock settings: {}", e),
        }
    }

    /// Replace the settings and start or stop the periodic clickers whose
    /// toggle changed. Returns the settings in effect afterwards.
    ///
    /// When a clicker cannot start, its toggle is switched back off and the
    /// audio error is returned.
    pub fn update_settings(&self, new_settings: Settings) -> Result<Settings, AppError> {
        let previous = {
            let mut settings = self.settings.lock().map_err(|_| AppError::Lock("settings"))?;
            std::mem::replace(&mut *settings, new_settings)
        };
        let changed = previous.changed_fields(&new_settings);
        if !changed.is_empty() {
            info!("Settings changed: {:?}", changed);
        }
        self.record_action("settings");
        self.mark_interaction();

        let mut failure = None;
        if previous.metronome_enabled != new_settings.metronome_enabled {
            if new_settings.metronome_enabled {
                failure = self.start_metronome().err();
            } else {
                self.stop_metronome();
            }
        }
        if previous.audio_testing_enabled != new_settings.audio_testing_enabled {
            if new_settings.audio_testing_enabled {
                if let Err(e) = self.start_audio_testing() {
                    failure.get_or_insert(e);
                }
            } else {
                self.stop_audio_testing();
            }
        }

        match failure {
            Some(e) => Err(e.into()),
            None => self.get_settings(),
        }
    }

    /// Read-only view of the engine for the metronome
    pub fn active_timers_probe(&self) -> Arc<dyn ActiveTimers> {
        let engine = Arc::clone(&self.engine);
        Arc::new(move || {
            engine
                .lock()
                .map(|engine| engine.has_running())
                .unwrap_or(false)
        })
    }

    /// Start the metronome; on failure the metronome setting is switched off.
    /// `Ok(false)` means it was already running.
    pub fn start_metronome(&self) -> Result<bool, AudioError> {
        self.alerts
            .start_periodic(self.active_timers_probe())
            .inspect_err(|e| {
                warn!("Failed to start metronome: {}", e);
                self.set_flag(|settings| settings.metronome_enabled = false);
            })
    }

    pub fn stop_metronome(&self) {
        self.alerts.stop_periodic();
    }

    pub fn start_audio_testing(&self) -> Result<bool, AudioError> {
        let always: Arc<dyn ActiveTimers> = Arc::new(|| true);
        self.audio_test.start_periodic(always).inspect_err(|e| {
            warn!("Failed to start audio testing: {}", e);
            self.set_flag(|settings| settings.audio_testing_enabled = false);
        })
    }

    pub fn stop_audio_testing(&self) {
        self.audio_test.stop_periodic();
    }

    /// Ad hoc click for checking the audio output
    pub fn play_test_click(&self) {
        self.note_user_interaction();
        self.alerts.play_once(Cue::Click);
    }

    /// Alert once for a whole completion batch
    pub fn handle_completion(&self, timers: &[TimerId]) {
        info!("{} timer(s) completed: alerting", timers.len());
        let settings = match self.get_settings() {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Skipping completion alert: {}", e);
                return;
            }
        };
        if settings.audio_enabled {
            self.alerts.play_once(Cue::Alert);
        }
        if settings.flash_enabled {
            self.alerts.flash();
        }
    }

    /// First-interaction guard: acquire the audio device once. Returns true
    /// only for the call that flipped the guard.
    fn mark_interaction(&self) -> bool {
        if self.user_interacted.swap(true, Ordering::SeqCst) {
            return false;
        }
        debug!("First user interaction");
        if let Err(e) = self.device.initialize() {
            warn!("Audio unavailable: {}", e);
        }
        true
    }

    fn note_user_interaction(&self) {
        if !self.mark_interaction() {
            return;
        }
        if !self.get_settings().is_ok_and(|s| s.metronome_enabled) {
            return;
        }
        if let Err(e) = self.start_metronome() {
            debug!("Metronome not started on first interaction: {}", e);
        }
    }

    /// Make sure the metronome is going and click right away
    fn on_timers_started(&self) {
        self.mark_interaction();
        if !self.get_settings().is_ok_and(|s| s.metronome_enabled) {
            return;
        }
        // A fresh start already clicked because timers are running.
        if let Ok(false) = self.start_metronome() {
            self.alerts.play_once(Cue::Click);
        }
    }

    pub fn has_user_interacted(&self) -> bool {
        self.user_interacted.load(Ordering::SeqCst)
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    /// Stop both clickers and release the audio output
    pub fn shutdown(&self) {
        self.stop_audio_testing();
        self.stop_metronome();
        self.device.close();
        info!("Alerts shut down");
    }
}
