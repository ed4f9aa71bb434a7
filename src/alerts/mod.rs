//! Audio and visual alerts
//!
//! One [`AudioDevice`] is shared by every [`AlertScheduler`] so the
//! application only ever holds a single live output.

pub mod device;
pub mod events;
pub mod output;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

pub use device::AudioDevice;
pub use events::{Cue, UiEvent};
pub use output::{build_output, AlertOutput, OutputKind};
pub use scheduler::{ActiveTimers, AlertScheduler, CLICK_PERIOD, FLASH_DURATION};
