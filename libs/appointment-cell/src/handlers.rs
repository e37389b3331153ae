// libs/appointment-cell/src/handlers.rs
use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use chrono::Utc;
use uuid::Uuid;

use shared_models::auth::AuthUser;
use shared_models::error::AppError;

use crate::models::{
    AppointmentError, BookAppointmentRequest, CancelAppointmentRequest, ListScope,
};
use crate::services::booking::BookingService;
use crate::AppointmentCellState;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub scope: Option<ListScope>,
}

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<AppointmentCellState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state);

    let appointment = service
        .book_appointment(&user, request, Utc::now())
        .await
        .map_err(|e| match e {
            AppointmentError::DoctorNotFound => {
                AppError::NotFound("Doctor not found".to_string())
            }
            AppointmentError::SlotTaken => {
                AppError::Conflict("Appointment slot no longer available".to_string())
            }
            AppointmentError::NotAllowed(msg) => AppError::Forbidden(msg),
            AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
            AppointmentError::Unavailable(msg) => AppError::Upstream(msg),
            other => AppError::Internal(other.to_string()),
        })?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment scheduled"
    })))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<AppointmentCellState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state);

    let appointments = service
        .list_appointments(&user, query.scope, Utc::now())
        .await
        .map_err(|e| match e {
            AppointmentError::Unavailable(msg) => AppError::Upstream(msg),
            other => AppError::Internal(other.to_string()),
        })?;

    Ok(Json(json!({
        "success": true,
        "count": appointments.len(),
        "appointments": appointments
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<AppointmentCellState>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state);

    let appointment = service
        .get_appointment(&user, appointment_id)
        .await
        .map_err(|e| match e {
            AppointmentError::AppointmentNotFound => {
                AppError::NotFound("Appointment not found".to_string())
            }
            AppointmentError::NotAllowed(msg) => AppError::Forbidden(msg),
            AppointmentError::Unavailable(msg) => AppError::Upstream(msg),
            other => AppError::Internal(other.to_string()),
        })?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<AppointmentCellState>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<CancelAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state);

    let appointment = service
        .cancel_appointment(&user, appointment_id, request, Utc::now())
        .await
        .map_err(|e| match e {
            AppointmentError::AppointmentNotFound => {
                AppError::NotFound("Appointment not found".to_string())
            }
            AppointmentError::NotAllowed(msg) => AppError::Forbidden(msg),
            AppointmentError::InvalidTransition { from, to } => {
                AppError::State(format!("Cannot move appointment from {} to {}", from, to))
            }
            AppointmentError::Unavailable(msg) => AppError::Upstream(msg),
            other => AppError::Internal(other.to_string()),
        })?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment cancelled"
    })))
}

#[axum::debug_handler]
pub async fn mark_no_show(
    State(state): State<AppointmentCellState>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state);

    let appointment = service
        .mark_no_show(&user, appointment_id, Utc::now())
        .await
        .map_err(|e| match e {
            AppointmentError::AppointmentNotFound => {
                AppError::NotFound("Appointment not found".to_string())
            }
            AppointmentError::NotAllowed(msg) => AppError::Forbidden(msg),
            AppointmentError::InvalidTransition { from, to } => {
                AppError::State(format!("Cannot move appointment from {} to {}", from, to))
            }
            AppointmentError::Unavailable(msg) => AppError::Upstream(msg),
            other => AppError::Internal(other.to_string()),
        })?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment marked as no-show"
    })))
}
