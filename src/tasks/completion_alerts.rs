//! Completion alert background task

use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::{alerts::UiEvent, state::AppState};

/// Plays one alert and one flash per completion batch
pub async fn completion_alert_task(state: Arc<AppState>) {
    info!("Starting completion alert task");

    let mut events_rx = state.events_tx.subscribe();

    loop {
        match events_rx.recv().await {
            Ok(UiEvent::Completed { timers }) => state.handle_completion(&timers),
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                warn!("Completion alert task lagged, skipped {} events", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }

    info!("Completion alert task stopped");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::sleep;

    use super::*;
    use crate::{
        alerts::{testing::Recorder, Cue},
        state::{ManualClock, Settings, TimerId},
    };

    #[tokio::test(start_paused = true)]
    async fn one_alert_per_completion_batch() {
        let recorder = Recorder::default();
        let output = recorder.clone();
        let state = Arc::new(AppState::with_output(
            0,
            "127.0.0.1".to_string(),
            Settings::new(),
            Arc::new(ManualClock::new(0)),
            |_| Box::new(output),
        ));
        state.device.initialize().unwrap();
        tokio::spawn(completion_alert_task(Arc::clone(&state)));
        sleep(Duration::from_millis(10)).await;

        state
            .events_tx
            .send(UiEvent::Completed {
                timers: vec![TimerId(1), TimerId(2), TimerId(3)],
            })
            .unwrap();
        state.events_tx.send(UiEvent::Sound { cue: Cue::Click }).unwrap();
        sleep(Duration::from_millis(10)).await;

        assert_eq!(recorder.alerts(), 1);
        assert_eq!(recorder.flashes(), 1);
    }
}
