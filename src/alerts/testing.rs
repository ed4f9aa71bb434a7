//! Recording output for tests

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use super::{events::Cue, output::AlertOutput};
use crate::error::AudioError;

#[derive(Debug, Default)]
struct Counters {
    init: AtomicUsize,
    clicks: AtomicUsize,
    alerts: AtomicUsize,
    flashes: AtomicUsize,
}

/// Counts every call it receives; clones share the counters
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    counters: Arc<Counters>,
    fail_init: bool,
    fail_play: bool,
}

impl Recorder {
    pub fn failing_init() -> Self {
        Self {
            fail_init: true,
            ..Self::default()
        }
    }

    pub fn failing_play() -> Self {
        Self {
            fail_play: true,
            ..Self::default()
        }
    }

    pub fn init_calls(&self) -> usize {
        self.counters.init.load(Ordering::SeqCst)
    }

    pub fn clicks(&self) -> usize {
        self.counters.clicks.load(Ordering::SeqCst)
    }

    pub fn alerts(&self) -> usize {
        self.counters.alerts.load(Ordering::SeqCst)
    }

    pub fn flashes(&self) -> usize {
        self.counters.flashes.load(Ordering::SeqCst)
    }
}

impl AlertOutput for Recorder {
    fn initialize(&mut self) -> Result<(), AudioError> {
        self.counters.init.fetch_add(1, Ordering::SeqCst);
        if self.fail_init {
            return Err(AudioError::Unavailable("no audio device".to_string()));
        }
        Ok(())
    }

    fn play(&mut self, cue: Cue) -> Result<(), AudioError> {
        if self.fail_play {
            return Err(AudioError::Playback("device busy".to_string()));
        }
        let counter = match cue {
            Cue::Click => &self.counters.clicks,
            Cue::Alert => &self.counters.alerts,
        };
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn flash(&mut self, _duration: Duration) -> Result<(), AudioError> {
        self.counters.flashes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
