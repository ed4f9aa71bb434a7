//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and response structures.

pub mod events;
pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use events::events_handler;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/timers", get(list_timers_handler).post(create_timer_handler))
        .route("/timers/batch", post(batch_handler))
        .route("/timers/start-all", post(start_all_handler))
        .route("/timers/pause-all", post(pause_all_handler))
        .route("/timers/toggle-all", post(toggle_all_handler))
        .route("/timers/reset-all", post(reset_all_handler))
        .route("/timers/:id", delete(remove_handler))
        .route("/timers/:id/toggle", post(toggle_handler))
        // Duration editor
        .route("/timers/:id/edit", post(start_edit_handler))
        .route("/timers/:id/edit/save", post(save_edit_handler))
        .route("/timers/:id/edit/cancel", post(cancel_edit_handler))
        .route("/timers/:id/edit/:field", put(edit_input_handler))
        .route("/settings", get(get_settings_handler).put(put_settings_handler))
        .route("/audio/click", post(click_handler))
        .route("/events", get(events_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
