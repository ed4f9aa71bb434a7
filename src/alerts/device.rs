//! The single shared audio device

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
    time::Duration,
};

use tracing::{error, info, warn};

use super::{events::Cue, output::AlertOutput};
use crate::error::AudioError;

/// Lazily initialised wrapper around an [`AlertOutput`].
///
/// Initialisation failure disables the device. Playback failures are logged
/// and swallowed so callers never have to treat audio as fatal.
pub struct AudioDevice {
    output: Mutex<Box<dyn AlertOutput>>,
    initialized: AtomicBool,
    enabled: AtomicBool,
}

impl fmt::Debug for AudioDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioDevice")
            .field("initialized", &self.is_initialized())
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl AudioDevice {
    pub fn new(output: Box<dyn AlertOutput>) -> Self {
        Self {
            output: Mutex::new(output),
            initialized: AtomicBool::new(false),
            enabled: AtomicBool::new(true),
        }
    }

    /// Initialise the output once. Later calls are no-ops.
    pub fn initialize(&self) -> Result<(), AudioError> {
        if self.is_initialized() {
            return Ok(());
        }

        let mut output = self
            .output
            .lock()
            .map_err(|e| AudioError::Unavailable(format!("failed to lock audio output: {}", e)))?;
        if self.is_initialized() {
            return Ok(());
        }

        match output.initialize() {
            Ok(()) => {
                self.initialized.store(true, Ordering::SeqCst);
                info!("Audio output initialized");
                Ok(())
            }
            Err(e) => {
                self.enabled.store(false, Ordering::SeqCst);
                error!("Failed to initialize audio output: {}", e);
                Err(e)
            }
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn is_available(&self) -> bool {
        self.is_enabled() && self.is_initialized()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Play a cue if the device is usable; failures only produce a warning
    pub fn play(&self, cue: Cue) {
        if !self.is_available() {
            return;
        }
        match self.output.lock() {
            Ok(mut output) => {
                if let Err(e) = output.play(cue) {
                    warn!("Failed to play {:?} cue: {}", cue, e);
                }
            }
            Err(e) => warn!("Failed to lock audio output: {}", e),
        }
    }

    /// Flashing is visual, so it does not depend on audio being available
    pub fn flash(&self, duration: Duration) {
        match self.output.lock() {
            Ok(mut output) => {
                if let Err(e) = output.flash(duration) {
                    warn!("Failed to flash: {}", e);
                }
            }
            Err(e) => warn!("Failed to lock alert output: {}", e),
        }
    }

    /// Release the output. A later `initialize` acquires it again.
    pub fn close(&self) {
        if let Ok(mut output) = self.output.lock() {
            output.close();
        }
        self.initialized.store(false, Ordering::SeqCst);
    }
}
