//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.

use super::{
    AppState,
    types::{
        ControlRequest, ControlResponse, FrameRequest, FrameResponse, HandFingers, HealthResponse,
        StatsResponse, StatusResponse,
    },
};
use crate::source::Control;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sonara_core::{PauseChange, SonaraError, StepOutcome};

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATUS HANDLER
// =============================================================================

/// Current overlay.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let tracker = state.tracker.read().await;
    let view = tracker.overlay();
    (StatusCode::OK, Json(StatusResponse::from(&view)))
}

// =============================================================================
// STATS HANDLER
// =============================================================================

/// Lifetime statistics and the session in progress.
pub async fn stats_handler(State(state): State<AppState>) -> impl IntoResponse {
    let tracker = state.tracker.read().await;
    let response = StatsResponse::new(tracker.record(), Some(tracker.session()));
    (StatusCode::OK, Json(response))
}

// =============================================================================
// FRAME HANDLER
// =============================================================================

/// Feed one detector frame.
pub async fn frame_handler(
    State(state): State<AppState>,
    Json(request): Json<FrameRequest>,
) -> impl IntoResponse {
    let frame = match request.to_frame() {
        Ok(f) => f,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(FrameResponse::error(format!("Invalid frame: {}", e))),
            );
        }
    };

    let mut tracker = state.tracker.write().await;
    let hands: Vec<HandFingers> = frame
        .considered_hands(tracker.config().min_hand_score)
        .into_iter()
        .map(HandFingers::from)
        .collect();

    let update = tracker.handle_frame(&frame);
    let counted = matches!(
        update.outcome,
        StepOutcome::Repetition(_) | StepOutcome::Completed(_)
    );

    (
        StatusCode::OK,
        Json(FrameResponse::success(
            counted,
            update.observation.fingers(),
            hands,
            tracker.session(),
        )),
    )
}

// =============================================================================
// CONTROL HANDLER
// =============================================================================

/// Apply a user control.
///
/// `quit` ends the session (saving it per the usual policy) and starts a new
/// one; the server keeps running.
pub async fn control_handler(
    State(state): State<AppState>,
    Json(request): Json<ControlRequest>,
) -> impl IntoResponse {
    let control = match request.to_control() {
        Ok(c) => c,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ControlResponse::error(None, e.to_string())),
            );
        }
    };

    let mut tracker = state.tracker.write().await;
    match control {
        Control::Pause => match tracker.toggle_pause() {
            Ok(change) => {
                let message = match change {
                    PauseChange::Paused => "Session paused",
                    PauseChange::Resumed => "Session resumed",
                };
                let session_state = tracker.session().state();
                (
                    StatusCode::OK,
                    Json(ControlResponse::success(control, session_state, message)),
                )
            }
            Err(SonaraError::SessionComplete) => (
                StatusCode::CONFLICT,
                Json(ControlResponse::error(
                    Some(control),
                    "Session already completed. Cannot pause.",
                )),
            ),
            Err(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ControlResponse::error(Some(control), e.to_string())),
            ),
        },

        Control::Reset => {
            tracker.restart();
            tracing::info!("Session reset");
            let session_state = tracker.session().state();
            (
                StatusCode::OK,
                Json(ControlResponse::success(control, session_state, "Session reset")),
            )
        }

        Control::Stats => {
            let stats = StatsResponse::new(tracker.record(), Some(tracker.session()));
            let session_state = tracker.session().state();
            (
                StatusCode::OK,
                Json(
                    ControlResponse::success(control, session_state, "Statistics")
                        .with_stats(stats),
                ),
            )
        }

        Control::Quit => {
            if let Err(e) = tracker.finish() {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ControlResponse::error(
                        Some(control),
                        format!("Save failed: {}", e),
                    )),
                );
            }
            tracker.restart();
            tracing::info!("Session ended, new session started");
            let stats = StatsResponse::new(tracker.record(), None);
            let session_state = tracker.session().state();
            (
                StatusCode::OK,
                Json(
                    ControlResponse::success(control, session_state, "Session ended")
                        .with_stats(stats),
                ),
            )
        }
    }
}
