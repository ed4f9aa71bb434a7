//! Timer update loop background task

use std::{sync::Arc, time::Duration};
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::state::AppState;

/// Drives the engine's update loop.
///
/// Sleeps until the next whole-second boundary relative to the instant the
/// loop was armed, runs one update pass, and goes idle once the engine
/// reports nothing running. Wakes up again when the engine re-arms the loop.
pub async fn update_loop_task(state: Arc<AppState>) {
    info!("Starting timer update loop task");

    let mut loop_rx = state.loop_tx.subscribe();

    loop {
        let armed_at = *loop_rx.borrow_and_update();
        if armed_at.is_none() {
            // Idle until something starts a timer
            if loop_rx.changed().await.is_err() {
                break;
            }
            continue;
        }

        let delay = match state.next_tick_delay() {
            Ok(Some(delay)) => delay,
            Ok(None) => {
                // Stopped but not yet published; wait for the watch to catch up
                if loop_rx.changed().await.is_err() {
                    break;
                }
                continue;
            }
            Err(e) => {
                error!("Failed to compute next tick: {}", e);
                sleep(Duration::from_secs(1)).await;
                continue;
            }
        };

        tokio::select! {
            _ = sleep(delay) => {
                match state.run_update_pass() {
                    Ok(completed) if !completed.is_empty() => {
                        debug!("Update pass completed {} timer(s)", completed.len());
                    }
                    Ok(_) => {}
                    Err(e) => error!("Failed to run update pass: {}", e),
                }
            }

            // Loop stopped or re-armed; recompute the schedule
            changed = loop_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                debug!("Update loop state changed to {:?}", *loop_rx.borrow());
            }
        }
    }

    info!("Timer update loop task stopped");
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;
    use crate::{
        alerts::{testing::Recorder, UiEvent},
        state::{Clock, Settings, TimerStatus},
    };

    const T0: u64 = 1_700_000_000_000;

    /// Wall clock that follows tokio's (pausable) time
    struct TokioClock {
        base: Instant,
    }

    impl Clock for TokioClock {
        fn now_ms(&self) -> u64 {
            T0 + self.base.elapsed().as_millis() as u64
        }
    }

    fn app() -> Arc<AppState> {
        let clock = Arc::new(TokioClock { base: Instant::now() });
        let recorder = Recorder::default();
        Arc::new(AppState::with_output(
            0,
            "127.0.0.1".to_string(),
            Settings::new(),
            clock,
            |_| Box::new(recorder),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn counts_down_and_goes_idle_after_last_completion() {
        let state = app();
        let mut events = state.events_tx.subscribe();
        let timers = state.add_batch(&[3, 5]).unwrap();
        state.start_all(true).unwrap();
        tokio::spawn(update_loop_task(Arc::clone(&state)));

        sleep(Duration::from_millis(3_500)).await;
        let snapshot = state.timers().unwrap();
        assert_eq!(snapshot[0].status, TimerStatus::Completed);
        assert_eq!(snapshot[1].status, TimerStatus::Running);
        assert_eq!(snapshot[1].remaining_seconds, 2.0);
        assert!(state.loop_tx.borrow().is_some());

        sleep(Duration::from_millis(2_000)).await;
        let snapshot = state.timers().unwrap();
        assert_eq!(snapshot[1].status, TimerStatus::Completed);
        assert_eq!(*state.loop_tx.borrow(), None);

        assert_eq!(
            events.recv().await.unwrap(),
            UiEvent::Completed { timers: vec![timers[0].id] }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            UiEvent::Completed { timers: vec![timers[1].id] }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_stay_aligned_to_the_loop_start() {
        let state = app();
        let first = state.add_timer(0, 10).unwrap().id;
        state.toggle(first).unwrap();
        tokio::spawn(update_loop_task(Arc::clone(&state)));

        sleep(Duration::from_millis(1_500)).await;
        let second = state.add_timer(0, 10).unwrap().id;
        state.toggle(second).unwrap();

        // The next pass lands on the 2 s boundary, not 1 s after the toggle.
        sleep(Duration::from_millis(600)).await;
        let snapshot = state.timers().unwrap();
        assert_eq!(snapshot[0].id, first);
        assert_eq!(snapshot[0].remaining_seconds, 8.0);
        assert_eq!(snapshot[1].remaining_seconds, 9.5);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_loop_wakes_when_armed() {
        let state = app();
        tokio::spawn(update_loop_task(Arc::clone(&state)));

        sleep(Duration::from_secs(10)).await;
        let id = state.add_timer(0, 2).unwrap().id;
        state.toggle(id).unwrap();

        sleep(Duration::from_millis(2_100)).await;
        let snapshot = state.timers().unwrap();
        assert_eq!(snapshot[0].status, TimerStatus::Completed);
        assert_eq!(*state.loop_tx.borrow(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_unpublished_stop_instead_of_spinning() {
        let state = app();
        let stale = state.add_timer(0, 5).unwrap().id;
        state.toggle(stale).unwrap();
        // Engine stopped, watch still shows the old reference
        state.engine.lock().unwrap().stop_loop();
        tokio::spawn(update_loop_task(Arc::clone(&state)));

        sleep(Duration::from_millis(100)).await;
        state.reset_all().unwrap();
        assert_eq!(*state.loop_tx.borrow(), None);

        let id = state.add_timer(0, 2).unwrap().id;
        state.toggle(id).unwrap();
        sleep(Duration::from_millis(2_100)).await;

        let snapshot = state.timers().unwrap();
        assert_eq!(snapshot[0].status, TimerStatus::Ready);
        assert_eq!(snapshot[1].status, TimerStatus::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_stops_pending_tick() {
        let state = app();
        let id = state.add_timer(0, 1).unwrap().id;
        state.toggle(id).unwrap();
        tokio::spawn(update_loop_task(Arc::clone(&state)));

        sleep(Duration::from_millis(500)).await;
        state.reset_all().unwrap();
        sleep(Duration::from_millis(2_000)).await;

        let snapshot = state.timers().unwrap();
        assert_eq!(snapshot[0].status, TimerStatus::Ready);
        assert_eq!(snapshot[0].remaining_seconds, 1.0);
    }
}
