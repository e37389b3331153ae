use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use shared_models::auth::AuthUser;
use shared_models::error::AppError;

use crate::models::{DoctorError, RegisterDoctorRequest, SetAvailabilityRequest};
use crate::services::{availability::AvailabilityService, directory::DirectoryService};
use crate::DoctorCellState;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    pub date: NaiveDate,
}

// ==============================================================================
// DIRECTORY HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn register_doctor(
    State(state): State<DoctorCellState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<RegisterDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can register doctors".to_string(),
        ));
    }

    let service = DirectoryService::new(&state);
    let doctor = service
        .register_doctor(request, Utc::now())
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({
        "success": true,
        "doctor": doctor
    })))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<DoctorCellState>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = DirectoryService::new(&state);
    let doctor = service.get_doctor(doctor_id).await.map_err(map_doctor_error)?;

    Ok(Json(json!({
        "success": true,
        "doctor": doctor
    })))
}

// ==============================================================================
// AVAILABILITY HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<DoctorCellState>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = DirectoryService::new(&state);
    let windows = service
        .get_availability(doctor_id)
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({
        "success": true,
        "availability": windows
    })))
}

#[axum::debug_handler]
pub async fn set_availability(
    State(state): State<DoctorCellState>,
    Extension(user): Extension<AuthUser>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<SetAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    // A doctor manages their own schedule; admins can manage anyone's.
    let is_own_schedule = user.is_doctor() && user.id == doctor_id;
    if !is_own_schedule && !user.is_admin() {
        return Err(AppError::Forbidden(
            "Not authorized to manage this doctor's availability".to_string(),
        ));
    }

    let service = DirectoryService::new(&state);
    let windows = service
        .set_availability(doctor_id, request)
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({
        "success": true,
        "availability": windows,
        "message": "Availability updated"
    })))
}

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<DoctorCellState>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<Value>, AppError> {
    let service = AvailabilityService::new(&state);
    let slots = service
        .available_slots(doctor_id, query.date, Utc::now())
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({
        "success": true,
        "date": query.date,
        "slots": slots
    })))
}

fn map_doctor_error(err: DoctorError) -> AppError {
    match err {
        DoctorError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
        DoctorError::InvalidWindow(msg) => AppError::ValidationError(msg),
        DoctorError::WindowOverlap(msg) => AppError::ValidationError(msg),
        DoctorError::ValidationError(msg) => AppError::ValidationError(msg),
        DoctorError::Unavailable(msg) => AppError::Upstream(msg),
    }
}
