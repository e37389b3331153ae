// libs/payment-cell/src/handlers.rs
use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use chrono::Utc;
use uuid::Uuid;

use shared_models::auth::AuthUser;
use shared_models::error::AppError;

use crate::models::{PaymentError, SettlePaymentRequest};
use crate::services::gate::PaymentGateService;
use crate::PaymentCellState;

#[axum::debug_handler]
pub async fn settle_payment(
    State(state): State<PaymentCellState>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<SettlePaymentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = PaymentGateService::new(&state);

    let settlement = service
        .settle(&user, appointment_id, request, Utc::now())
        .await
        .map_err(|e| match e {
            PaymentError::AppointmentNotFound => {
                AppError::NotFound("Appointment not found".to_string())
            }
            PaymentError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
            PaymentError::GateClosed { .. } => AppError::State(e.to_string()),
            PaymentError::UnsettledOutcome(_) => AppError::ValidationError(e.to_string()),
            PaymentError::NotAllowed(msg) => AppError::Forbidden(msg),
            PaymentError::ValidationError(msg) => AppError::ValidationError(msg),
            PaymentError::Unavailable(msg) => AppError::Upstream(msg),
        })?;

    Ok(Json(json!({
        "success": true,
        "payment": settlement.payment,
        "appointment": settlement.appointment
    })))
}

#[axum::debug_handler]
pub async fn get_payment_history(
    State(state): State<PaymentCellState>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = PaymentGateService::new(&state);

    let payments = service
        .history(&user, appointment_id)
        .await
        .map_err(|e| match e {
            PaymentError::AppointmentNotFound => {
                AppError::NotFound("Appointment not found".to_string())
            }
            PaymentError::NotAllowed(msg) => AppError::Forbidden(msg),
            PaymentError::Unavailable(msg) => AppError::Upstream(msg),
            other => AppError::Internal(other.to_string()),
        })?;

    Ok(Json(json!({
        "success": true,
        "count": payments.len(),
        "payments": payments
    })))
}
