//! Event types pushed to the UI

use serde::{Deserialize, Serialize};

use crate::state::TimerId;

/// Sounds the alert layer can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    /// Short 800 Hz tick used by the metronome and audio testing
    Click,
    /// Gentle rising chirp played when timers complete
    Alert,
}

/// Everything the browser needs to render sound, flashes and completions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiEvent {
    /// Timers that completed together in one update pass
    Completed { timers: Vec<TimerId> },

    /// Play a cue
    Sound { cue: Cue },

    /// Show the full-screen flash overlay
    Flash { duration_ms: u64 },
}

impl UiEvent {
    /// Name used for the SSE `event:` field
    pub fn name(&self) -> &'static str {
        match self {
            UiEvent::Completed { .. } => "completed",
            UiEvent::Sound { .. } => "sound",
            UiEvent::Flash { .. } => "flash",
        }
    }
}
