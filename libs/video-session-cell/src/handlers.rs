// libs/video-session-cell/src/handlers.rs
use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use chrono::Utc;
use uuid::Uuid;

use shared_models::auth::AuthUser;
use shared_models::error::AppError;

use crate::models::SessionError;
use crate::services::session::SessionLifecycleService;
use crate::VideoSessionCellState;

#[axum::debug_handler]
pub async fn start_session(
    State(state): State<VideoSessionCellState>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = SessionLifecycleService::new(&state);

    let session = service
        .start_session(&user, appointment_id, Utc::now())
        .await
        .map_err(map_session_error)?;

    Ok(Json(json!({
        "success": true,
        "session": session
    })))
}

#[axum::debug_handler]
pub async fn get_active_session(
    State(state): State<VideoSessionCellState>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = SessionLifecycleService::new(&state);

    let session = service
        .active_for_appointment(&user, appointment_id)
        .await
        .map_err(map_session_error)?;

    Ok(Json(json!({
        "success": true,
        "session": session
    })))
}

#[axum::debug_handler]
pub async fn get_session(
    State(state): State<VideoSessionCellState>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = SessionLifecycleService::new(&state);

    let session = service
        .get_session(&user, session_id)
        .await
        .map_err(map_session_error)?;

    Ok(Json(json!({
        "success": true,
        "session": session
    })))
}

#[axum::debug_handler]
pub async fn join_session(
    State(state): State<VideoSessionCellState>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = SessionLifecycleService::new(&state);

    let session = service
        .join_session(&user, session_id, Utc::now())
        .await
        .map_err(map_session_error)?;

    let room_reference = session.room_reference.clone();
    Ok(Json(json!({
        "success": true,
        "session": session,
        "room_reference": room_reference
    })))
}

#[axum::debug_handler]
pub async fn end_session(
    State(state): State<VideoSessionCellState>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = SessionLifecycleService::new(&state);

    let session = service
        .end_session(&user, session_id, Utc::now())
        .await
        .map_err(map_session_error)?;

    Ok(Json(json!({
        "success": true,
        "session": session,
        "message": "Session ended"
    })))
}

fn map_session_error(err: SessionError) -> AppError {
    match err {
        SessionError::AppointmentNotFound => AppError::NotFound("Appointment not found".to_string()),
        SessionError::SessionNotFound => AppError::NotFound("Session not found".to_string()),
        SessionError::NotVirtual => AppError::ValidationError(err.to_string()),
        SessionError::TooEarly { .. } => AppError::State(err.to_string()),
        SessionError::InvalidAppointmentState { .. } => AppError::State(err.to_string()),
        SessionError::SessionConcluded { .. } => AppError::State(err.to_string()),
        SessionError::Contested => AppError::Conflict(err.to_string()),
        SessionError::NotAllowed(msg) => AppError::Forbidden(msg),
        SessionError::ValidationError(msg) => AppError::ValidationError(msg),
        SessionError::Unavailable(msg) => AppError::Upstream(msg),
    }
}
