//! Concrete alert outputs

use std::{
    io::{IsTerminal, Write},
    time::Duration,
};

use clap::ValueEnum;
use tokio::sync::broadcast;
use tracing::trace;

use super::events::{Cue, UiEvent};
use crate::error::AudioError;

/// Where audio cues and flashes end up
pub trait AlertOutput: Send {
    /// Acquire the underlying device. Called once before the first cue.
    fn initialize(&mut self) -> Result<(), AudioError> {
        Ok(())
    }

    fn play(&mut self, cue: Cue) -> Result<(), AudioError>;

    fn flash(&mut self, duration: Duration) -> Result<(), AudioError>;

    fn close(&mut self) {}
}

/// Selectable output backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputKind {
    /// Forward cues to connected browsers over the event stream
    Events,
    /// Ring the terminal bell
    Bell,
    /// Discard everything
    Silent,
}

pub fn build_output(kind: OutputKind, events_tx: broadcast::Sender<UiEvent>) -> Box<dyn AlertOutput> {
    match kind {
        OutputKind::Events => Box::new(EventOutput::new(events_tx)),
        OutputKind::Bell => Box::new(BellOutput::default()),
        OutputKind::Silent => Box::new(SilentOutput),
    }
}

/// Publishes cues on the UI event channel; the browser synthesises the sound
#[derive(Debug)]
pub struct EventOutput {
    events_tx: broadcast::Sender<UiEvent>,
}

impl EventOutput {
    pub fn new(events_tx: broadcast::Sender<UiEvent>) -> Self {
        Self { events_tx }
    }

    fn publish(&self, event: UiEvent) {
        // No subscribers just means no browser is connected.
        if self.events_tx.send(event).is_err() {
            trace!("No UI subscribers for alert event");
        }
    }
}

impl AlertOutput for EventOutput {
    fn play(&mut self, cue: Cue) -> Result<(), AudioError> {
        self.publish(UiEvent::Sound { cue });
        Ok(())
    }

    fn flash(&mut self, duration: Duration) -> Result<(), AudioError> {
        self.publish(UiEvent::Flash {
            duration_ms: duration.as_millis() as u64,
        });
        Ok(())
    }
}

/// Terminal bell on stderr. Has no way to flash.
#[derive(Debug, Default)]
pub struct BellOutput {
    ready: bool,
}

impl AlertOutput for BellOutput {
    fn initialize(&mut self) -> Result<(), AudioError> {
        if !std::io::stderr().is_terminal() {
            return Err(AudioError::Unavailable("stderr is not a terminal".to_string()));
        }
        self.ready = true;
        Ok(())
    }

    fn play(&mut self, cue: Cue) -> Result<(), AudioError> {
        if !self.ready {
            return Err(AudioError::Unavailable("terminal bell not initialized".to_string()));
        }
        // Two bells for completion so it stands out from the metronome.
        let bells: &[u8] = match cue {
            Cue::Click => b"\x07",
            Cue::Alert => b"\x07\x07",
        };
        let mut stderr = std::io::stderr().lock();
        stderr
            .write_all(bells)
            .and_then(|_| stderr.flush())
            .map_err(|e| AudioError::Playback(e.to_string()))
    }

    fn flash(&mut self, _duration: Duration) -> Result<(), AudioError> {
        Ok(())
    }

    fn close(&mut self) {
        self.ready = false;
    }
}

#[derive(Debug, Default)]
pub struct SilentOutput;

impl AlertOutput for SilentOutput {
    fn play(&mut self, _cue: Cue) -> Result<(), AudioError> {
        Ok(())
    }

    fn flash(&mut self, _duration: Duration) -> Result<(), AudioError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_output_publishes_cues_and_flashes() {
        let (tx, mut rx) = broadcast::channel(8);
        let mut output = EventOutput::new(tx);

        output.play(Cue::Alert).unwrap();
        output.flash(Duration::from_millis(500)).unwrap();

        assert_eq!(rx.try_recv().unwrap(), UiEvent::Sound { cue: Cue::Alert });
        assert_eq!(rx.try_recv().unwrap(), UiEvent::Flash { duration_ms: 500 });
    }

    #[test]
    fn event_output_without_subscribers_is_not_an_error() {
        let (tx, rx) = broadcast::channel(8);
        drop(rx);
        let mut output = EventOutput::new(tx);
        assert!(output.play(Cue::Click).is_ok());
    }

    #[test]
    fn bell_refuses_to_play_before_initialize() {
        let mut bell = BellOutput::default();
        assert!(matches!(bell.play(Cue::Click), Err(AudioError::Unavailable(_))));
    }
}
