//! API request and response structures

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    state::{EditField, Settings, Timer, TimerEngine},
};

/// A timer plus the strings the UI renders for it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerView {
    #[serde(flatten)]
    pub timer: Timer,
    pub display: String,
    pub action_label: String,
}

impl From<&Timer> for TimerView {
    fn from(timer: &Timer) -> Self {
        Self {
            timer: timer.clone(),
            display: timer.display(),
            action_label: timer.status.action_label().to_string(),
        }
    }
}

/// The whole collection as the UI needs it after any change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimersSnapshot {
    pub timers: Vec<TimerView>,
    pub has_running: bool,
    pub can_start_all: bool,
    pub toggle_all_label: String,
}

impl From<&TimerEngine> for TimersSnapshot {
    fn from(engine: &TimerEngine) -> Self {
        Self {
            timers: engine.timers().iter().map(TimerView::from).collect(),
            has_running: engine.has_running(),
            can_start_all: engine.can_start_all(),
            toggle_all_label: engine.toggle_all_label().to_string(),
        }
    }
}

/// API response structure for timer endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub snapshot: TimersSnapshot,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>, snapshot: TimersSnapshot) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
            timestamp: Utc::now(),
            snapshot,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn new(message: String) -> Self {
        Self {
            status: "error".to_string(),
            message,
            timestamp: Utc::now(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Audio(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Lock(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsResponse {
    pub settings: Settings,
    pub metronome_active: bool,
    pub audio_testing_active: bool,
}

/// Status response with loop and alert diagnostics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub settings: Settings,
    pub timer_count: usize,
    pub has_running: bool,
    pub update_loop_started_at_ms: Option<u64>,
    pub metronome_active: bool,
    pub audio_testing_active: bool,
    pub audio_available: bool,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTimerRequest {
    #[serde(default)]
    pub minutes: i64,
    #[serde(default)]
    pub seconds: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchRequest {
    pub durations: Vec<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartAllRequest {
    pub include_completed: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartEditRequest {
    pub focus: Option<EditField>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditInputRequest {
    pub value: String,
}
