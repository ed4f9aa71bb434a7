//! Server-sent event stream for completions and alert cues

use std::{convert::Infallible, sync::Arc};
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{Stream, StreamExt};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

use crate::state::AppState;

/// Handle GET /events - Stream UI events until the client disconnects
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("Event stream subscriber connected");
    let stream = BroadcastStream::new(state.events_tx.subscribe()).filter_map(|message| async move {
        match message {
            Ok(event) => match Event::default().event(event.name()).json_data(&event) {
                Ok(sse_event) => Some(Ok(sse_event)),
                Err(e) => {
                    warn!("Failed to encode {} event: {}", event.name(), e);
                    None
                }
            },
            Err(e) => {
                warn!("Event stream subscriber fell behind: {}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
