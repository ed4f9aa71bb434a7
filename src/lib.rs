//! Multi Timer - Countdown timers served over HTTP
//!
//! This library runs any number of independent countdown timers off a single
//! update loop aligned to whole seconds, with a metronome that clicks while
//! timers run and an alert when they complete.

pub mod alerts;
pub mod api;
pub mod config;
pub mod error;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use error::{AppError, AudioError, ValidationError};
pub use state::{AppState, TimerEngine};
pub use utils::signals::shutdown_signal;
