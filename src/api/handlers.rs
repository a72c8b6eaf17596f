//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use tracing::{error, info};

use crate::state::{AppState, TimerIntent};
use super::responses::{
    timer_status, ApiResponse, HealthResponse, InputRequest, StatusResponse, TickRequest,
};

/// Send one intent to the timer and describe the outcome
async fn dispatch_intent(
    state: &AppState,
    intent: TimerIntent,
    message: &str,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.dispatch(intent).await {
        Ok(timer) => Ok(Json(ApiResponse::new(message.to_string(), timer))),
        Err(e) => {
            error!("Failed to dispatch intent: {}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

/// Handle POST /timer/input - Replace the pending duration text
pub async fn input_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<InputRequest>,
) -> Result<Json<ApiResponse>, StatusCode> {
    dispatch_intent(
        &state,
        TimerIntent::ChangeInput { text: request.text },
        "Input updated",
    )
    .await
}

/// Handle POST /timer/start - Start, resume, or report empty input
pub async fn start_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    let response = dispatch_intent(&state, TimerIntent::StartTimer, "Start requested").await?;

    let timer = &response.0.timer;
    if timer.is_input_empty {
        info!("Start requested with nothing to count down");
        return Ok(Json(ApiResponse::new(
            "Input is empty".to_string(),
            timer.clone(),
        )));
    }
    if timer.is_running {
        info!("Start endpoint called - timer running with {} left", timer.formatted);
    }
    Ok(response)
}

/// Handle POST /timer/pause - Suspend the running countdown
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    dispatch_intent(&state, TimerIntent::PauseTimer, "Pause requested").await
}

/// Handle POST /timer/unpause - Continue a paused countdown
pub async fn unpause_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    dispatch_intent(&state, TimerIntent::UnPauseTimer, "Unpause requested").await
}

/// Handle POST /timer/stop - Stop the timer and forget the remaining time
pub async fn stop_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    info!("Stop endpoint called");
    dispatch_intent(&state, TimerIntent::StopTimer, "Timer stopped").await
}

/// Handle POST /timer/reset-input-error - Acknowledge the empty input signal
pub async fn reset_input_error_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    dispatch_intent(&state, TimerIntent::ResetInputError, "Input error cleared").await
}

/// Handle POST /timer/tick - Report countdown progress from an external driver
pub async fn tick_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TickRequest>,
) -> Result<Json<ApiResponse>, StatusCode> {
    dispatch_intent(
        &state,
        TimerIntent::Tick {
            remaining_ms: request.remaining_ms,
        },
        "Tick applied",
    )
    .await
}

/// Handle GET /timer - Return current timer status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let timer = state.get_timer_state();
    let last = state.last_action();

    Json(StatusResponse {
        status: timer_status(&timer).to_string(),
        timer,
        uptime: state.uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action: last.as_ref().map(|action| action.name.to_string()),
        last_action_time: last.map(|action| action.at),
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
