//! Periodic predicate-gated clicks plus one-shot alerts

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::{
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, info, trace, warn};

use super::{device::AudioDevice, events::Cue};
use crate::error::AudioError;

/// Period of the metronome and audio-testing clicks
pub const CLICK_PERIOD: Duration = Duration::from_secs(1);

/// How long the completion flash stays on screen
pub const FLASH_DURATION: Duration = Duration::from_millis(500);

/// Read-only view answering "is any timer running right now"
pub trait ActiveTimers: Send + Sync {
    fn has_active_timers(&self) -> bool;
}

impl<F> ActiveTimers for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn has_active_timers(&self) -> bool {
        self()
    }
}

/// One periodic clicker sharing the application's audio device
#[derive(Debug)]
pub struct AlertScheduler {
    name: &'static str,
    device: Arc<AudioDevice>,
    period: Duration,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl AlertScheduler {
    pub fn new(name: &'static str, device: Arc<AudioDevice>) -> Self {
        Self::with_period(name, device, CLICK_PERIOD)
    }

    pub fn with_period(name: &'static str, device: Arc<AudioDevice>, period: Duration) -> Self {
        Self {
            name,
            device,
            period,
            handle: Mutex::new(None),
        }
    }

    pub fn device(&self) -> &Arc<AudioDevice> {
        &self.device
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .map(|handle| handle.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    /// Start clicking once per period while `predicate` holds.
    ///
    /// Returns `Ok(false)` without doing anything when already running. Must be
    /// called from within a tokio runtime.
    pub fn start_periodic(&self, predicate: Arc<dyn ActiveTimers>) -> Result<bool, AudioError> {
        let mut handle = self
            .handle
            .lock()
            .map_err(|e| AudioError::Unavailable(format!("failed to lock {}: {}", self.name, e)))?;
        if handle.as_ref().is_some_and(|h| !h.is_finished()) {
            return Ok(false);
        }

        self.device.initialize()?;
        if !self.device.is_enabled() {
            return Err(AudioError::Disabled);
        }

        if predicate.has_active_timers() {
            debug!("{}: playing initial click", self.name);
            self.device.play(Cue::Click);
        } else {
            debug!("{}: skipping initial click, nothing active", self.name);
        }

        let device = Arc::clone(&self.device);
        let period = self.period;
        let name = self.name;
        *handle = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if predicate.has_active_timers() {
                    trace!("{}: tick", name);
                    device.play(Cue::Click);
                } else {
                    trace!("{}: tick skipped, nothing active", name);
                }
            }
        }));

        info!("{} started", self.name);
        Ok(true)
    }

    /// Stop the periodic clicks. Safe to call when not running.
    pub fn stop_periodic(&self) {
        match self.handle.lock() {
            Ok(mut handle) => {
                if let Some(task) = handle.take() {
                    task.abort();
                    info!("{} stopped", self.name);
                }
            }
            Err(e) => warn!("Failed to lock {}: {}", self.name, e),
        }
    }

    pub fn play_once(&self, cue: Cue) {
        self.device.play(cue);
    }

    pub fn flash(&self) {
        self.device.flash(FLASH_DURATION);
    }
}

impl Drop for AlertScheduler {
    fn drop(&mut self) {
        if let Ok(mut handle) = self.handle.lock() {
            if let Some(task) = handle.take() {
                task.abort();
            }
        }
    }
}
