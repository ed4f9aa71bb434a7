//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, State},
    response::Json,
};
use tracing::{debug, info};

use crate::{
    error::AppError,
    state::{AppState, BatchAction, EditField, EditInput, TimerId},
};
use super::responses::{
    ApiResponse, BatchRequest, CreateTimerRequest, EditInputRequest, HealthResponse,
    SettingsResponse, StartAllRequest, StartEditRequest, StatusResponse, TimersSnapshot,
};

type ApiResult<T> = Result<Json<T>, AppError>;

fn snapshot(state: &AppState) -> Result<TimersSnapshot, AppError> {
    let engine = state.engine.lock().map_err(|_| AppError::Lock("timer engine"))?;
    Ok(TimersSnapshot::from(&*engine))
}

fn respond(state: &AppState, message: impl Into<String>) -> ApiResult<ApiResponse> {
    Ok(Json(ApiResponse::ok(message, snapshot(state)?)))
}

/// Handle GET /timers
pub async fn list_timers_handler(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse> {
    respond(&state, "Current timers")
}

/// Handle POST /timers - Create a timer from minutes and seconds
pub async fn create_timer_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateTimerRequest>,
) -> ApiResult<ApiResponse> {
    let timer = state.add_timer(request.minutes, request.seconds)?;
    info!("Create endpoint called - timer {} ({})", timer.id, timer.display());
    respond(&state, format!("Added timer {}", timer.display()))
}

/// Handle POST /timers/batch - Add several timers given in seconds
pub async fn batch_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BatchRequest>,
) -> ApiResult<ApiResponse> {
    let timers = state.add_batch(&request.durations)?;
    respond(&state, format!("Added {} timer(s)", timers.len()))
}

/// Handle POST /timers/start-all
pub async fn start_all_handler(
    State(state): State<Arc<AppState>>,
    request: Option<Json<StartAllRequest>>,
) -> ApiResult<ApiResponse> {
    let include_completed = request
        .and_then(|Json(request)| request.include_completed)
        .unwrap_or(true);
    let started = state.start_all(include_completed)?;
    respond(&state, format!("Started {} timer(s)", started))
}

/// Handle POST /timers/pause-all
pub async fn pause_all_handler(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse> {
    let paused = state.pause_all()?;
    respond(&state, format!("Paused {} timer(s)", paused))
}

/// Handle POST /timers/toggle-all - Pause everything or resume/start everything
pub async fn toggle_all_handler(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse> {
    let message = match state.toggle_all()? {
        BatchAction::Paused(n) => format!("Paused {} timer(s)", n),
        BatchAction::Started(n) => format!("Started {} timer(s)", n),
    };
    respond(&state, message)
}

/// Handle POST /timers/reset-all
pub async fn reset_all_handler(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse> {
    state.reset_all()?;
    respond(&state, "Reset all timers")
}

/// Handle POST /timers/:id/toggle
pub async fn toggle_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> ApiResult<ApiResponse> {
    let message = match state.toggle(TimerId(id))? {
        Some(status) => format!("Timer {} is now {:?}", id, status).to_lowercase(),
        None => format!("Timer {} not found", id),
    };
    respond(&state, message)
}

/// Handle DELETE /timers/:id
pub async fn remove_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> ApiResult<ApiResponse> {
    let message = if state.remove(TimerId(id))? {
        format!("Removed timer {}", id)
    } else {
        format!("Timer {} not found", id)
    };
    respond(&state, message)
}

/// Handle POST /timers/:id/edit - Open the duration editor
pub async fn start_edit_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    request: Option<Json<StartEditRequest>>,
) -> ApiResult<ApiResponse> {
    let focus = request
        .and_then(|Json(request)| request.focus)
        .unwrap_or(EditField::Minutes);
    state.start_edit(TimerId(id), focus)?;
    respond(&state, format!("Editing timer {}", id))
}

/// Handle PUT /timers/:id/edit/:field - Type into one of the edit inputs
pub async fn edit_input_handler(
    State(state): State<Arc<AppState>>,
    Path((id, field)): Path<(u64, EditField)>,
    Json(request): Json<EditInputRequest>,
) -> ApiResult<ApiResponse> {
    let outcome = state.input_edit_field(TimerId(id), field, &request.value)?;
    debug!("Edit input for timer {}: {:?}", id, outcome);
    let message = match outcome {
        Some(EditInput::Pending) => "Input stored".to_string(),
        Some(EditInput::AdvanceToSeconds) => "Minutes complete, continue with seconds".to_string(),
        Some(EditInput::Saved) => format!("Saved timer {}", id),
        Some(EditInput::Rejected(e)) => return Err(e.into()),
        None => format!("Timer {} is not being edited", id),
    };
    respond(&state, message)
}

/// Handle POST /timers/:id/edit/save
pub async fn save_edit_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> ApiResult<ApiResponse> {
    let message = if state.save_edit(TimerId(id))? {
        format!("Saved timer {}", id)
    } else {
        format!("Timer {} is not being edited", id)
    };
    respond(&state, message)
}

/// Handle POST /timers/:id/edit/cancel
pub async fn cancel_edit_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> ApiResult<ApiResponse> {
    state.cancel_edit(TimerId(id))?;
    respond(&state, format!("Cancelled edit of timer {}", id))
}

fn settings_response(state: &AppState) -> ApiResult<SettingsResponse> {
    Ok(Json(SettingsResponse {
        settings: state.get_settings()?,
        metronome_active: state.alerts.is_running(),
        audio_testing_active: state.audio_test.is_running(),
    }))
}

/// Handle GET /settings
pub async fn get_settings_handler(State(state): State<Arc<AppState>>) -> ApiResult<SettingsResponse> {
    settings_response(&state)
}

/// Handle PUT /settings
pub async fn put_settings_handler(
    State(state): State<Arc<AppState>>,
    Json(settings): Json<crate::state::Settings>,
) -> ApiResult<SettingsResponse> {
    state.update_settings(settings)?;
    settings_response(&state)
}

/// Handle POST /audio/click - Play a single test click
pub async fn click_handler(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse> {
    state.play_test_click();
    respond(&state, "Played test click")
}

/// Handle GET /status - Return current diagnostics
pub async fn status_handler(State(state): State<Arc<AppState>>) -> ApiResult<StatusResponse> {
    let (timer_count, has_running, update_loop_started_at_ms) = {
        let engine = state.engine.lock().map_err(|_| AppError::Lock("timer engine"))?;
        (engine.timers().len(), engine.has_running(), engine.loop_started_at_ms())
    };
    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        settings: state.get_settings()?,
        timer_count,
        has_running,
        update_loop_started_at_ms,
        metronome_active: state.alerts.is_running(),
        audio_testing_active: state.audio_test.is_running(),
        audio_available: state.device.is_available(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
