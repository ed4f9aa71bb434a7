//! Multi Timer - Countdown timers served over HTTP
//!
//! This is the main entry point for the multi-timer application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use multi_timer::{
    alerts::build_output,
    api::create_router,
    config::Config,
    state::{AppState, SystemClock},
    tasks::{completion_alert_task, update_loop_task},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("multi_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting multi-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, alerts={:?}",
        config.host, config.port, config.alert_output
    );

    let settings = config.settings();
    let alert_output = config.alert_output;
    let state = Arc::new(AppState::with_output(
        config.port,
        config.host.clone(),
        settings,
        Arc::new(SystemClock),
        |events_tx| build_output(alert_output, events_tx),
    ));

    if !config.preset.is_empty() {
        match state.add_batch(&config.preset) {
            Ok(timers) => info!("Created {} preset timer(s)", timers.len()),
            Err(e) => warn!("Ignoring preset timers: {}", e),
        }
    }
    if settings.audio_testing_enabled {
        if let Err(e) = state.start_audio_testing() {
            warn!("Audio testing disabled: {}", e);
        }
    }

    // Start the background tasks
    tokio::spawn(update_loop_task(Arc::clone(&state)));
    tokio::spawn(completion_alert_task(Arc::clone(&state)));

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /timers                  - List timers");
    info!("  POST /timers                  - Add a timer {{minutes, seconds}}");
    info!("  POST /timers/batch            - Add timers {{durations: [secs]}}");
    info!("  POST /timers/toggle-all       - Pause all or start all");
    info!("  POST /timers/:id/toggle       - Start, pause, resume or restart");
    info!("  POST /timers/:id/edit         - Edit a timer's duration");
    info!("  GET  /settings, PUT /settings - Feature toggles");
    info!("  GET  /events                  - Completion and alert event stream");
    info!("  GET  /status                  - Diagnostics");
    info!("  GET  /health                  - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    state.shutdown();
    info!("Server shutdown complete");
    Ok(())
}
