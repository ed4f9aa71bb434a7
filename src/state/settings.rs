//! User-facing feature toggles

use serde::{Deserialize, Serialize};

/// Feature toggles the UI flips. The engine and alert layer only read them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Play an audio cue when timers complete
    pub audio_enabled: bool,
    /// Flash the screen when timers complete
    pub flash_enabled: bool,
    /// Click once per second while any timer runs
    pub metronome_enabled: bool,
    /// Click once per second unconditionally, for checking audio output
    pub audio_testing_enabled: bool,
    /// Start timers as soon as they are created
    pub auto_start_new_timers: bool,
}

impl Settings {
    pub fn new() -> Self {
        Self {
            audio_enabled: true,
            flash_enabled: true,
            metronome_enabled: true,
            audio_testing_enabled: false,
            auto_start_new_timers: false,
        }
    }

    /// Names of the toggles that differ between `self` and `other`
    pub fn changed_fields(&self, other: &Settings) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.audio_enabled != other.audio_enabled {
            changed.push("audio_enabled");
        }
        if self.flash_enabled != other.flash_enabled {
            changed.push("flash_enabled");
        }
        if self.metronome_enabled != other.metronome_enabled {
            changed.push("metronome_enabled");
        }
        if self.audio_testing_enabled != other.audio_testing_enabled {
            changed.push("audio_testing_enabled");
        }
        if self.auto_start_new_timers != other.auto_start_new_timers {
            changed.push("auto_start_new_timers");
        }
        changed
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}
