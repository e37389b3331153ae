// libs/payment-cell/src/models.rs
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::appointment::{Appointment, AppointmentStatus};
use shared_models::payment::{Payment, PaymentMethod, PaymentStatus};
use shared_storage::StorageError;

// ==============================================================================
// REQUEST / RESPONSE MODELS
// ==============================================================================

/// Result reported by the payment collaborator for one charge attempt.
/// The scheduling core never talks to the gateway itself; it only records
/// the outcome and moves the appointment when the charge went through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlePaymentRequest {
    pub payment_method: PaymentMethod,
    pub outcome: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_last_four: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insurance_provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_number: Option<String>,
}

/// What a settle call leaves behind: the recorded attempt and the
/// appointment as the gate left it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSettlement {
    pub payment: Payment,
    pub appointment: Appointment,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Error)]
pub enum PaymentError {
    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Appointment is {status}; the payment window is closed")]
    GateClosed { status: AppointmentStatus },

    #[error("Payment outcome {0} does not settle the appointment")]
    UnsettledOutcome(PaymentStatus),

    #[error("Not allowed: {0}")]
    NotAllowed(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl From<StorageError> for PaymentError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) => PaymentError::AppointmentNotFound,
            StorageError::Unavailable(reason) => PaymentError::Unavailable(reason),
            other => PaymentError::ValidationError(other.to_string()),
        }
    }
}
