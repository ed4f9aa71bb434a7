//! State management module
//!
//! This module contains the timer engine, the timer entity, settings and the
//! application state that ties them to the alert layer.

pub mod app_state;
pub mod clock;
pub mod engine;
pub mod settings;
pub mod time_format;
pub mod timer;

// Re-export main types
pub use app_state::AppState;
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{aligned_delay, BatchAction, EditInput, TimerEngine, TICK_PERIOD_MS};
pub use settings::Settings;
pub use timer::{EditField, EditSession, Timer, TimerId, TimerStatus};
