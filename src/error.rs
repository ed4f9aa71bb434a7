//! Error types shared across the engine, alerts and HTTP layers

use thiserror::Error;

/// Malformed or out-of-range timer input. Reported synchronously; the timer
/// collection is never mutated when one of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("minutes must be between 0 and 59 (got {0})")]
    MinutesOutOfRange(i64),

    #[error("seconds must be between 0 and 59 (got {0})")]
    SecondsOutOfRange(i64),

    #[error("timer duration must be at least one second")]
    ZeroDuration,

    #[error("invalid time format {0:?}, expected MM:SS")]
    MalformedTime(String),

    #[error("timer durations cannot be negative (got {0})")]
    NegativeDuration(i64),

    #[error("timer duration {0} is too long")]
    DurationTooLong(i64),
}

/// Failures of the audio output. These are contained by the alert layer and
/// only surface from operations whose caller is expected to switch a feature off.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    #[error("audio output unavailable: {0}")]
    Unavailable(String),

    #[error("audio is disabled")]
    Disabled,

    #[error("audio playback failed: {0}")]
    Playback(String),
}

/// Application level error returned by `AppState` operations
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error("failed to lock {0}")]
    Lock(&'static str),
}
