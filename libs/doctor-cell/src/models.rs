use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use chrono::{DateTime, Utc};

use shared_storage::StorageError;

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Payload for registering a doctor in the directory. The `id` is the
/// doctor's identity id issued by the identity provider, so appointments
/// and sessions can authorize against the same value a JWT carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterDoctorRequest {
    pub id: Uuid,
    pub specialty: Option<String>,
    pub consultation_fee: f64,
    pub currency: Option<String>,
    pub is_verified: Option<bool>,
    pub is_available: Option<bool>,
}

/// One recurring weekly window, with clock values as "HH:MM" strings the
/// way clients submit them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityWindowInput {
    pub day_of_week: u8,
    pub start_time: String,
    pub end_time: String,
    pub is_enabled: Option<bool>,
}

/// Replaces a doctor's whole weekly schedule in one call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetAvailabilityRequest {
    pub windows: Vec<AvailabilityWindowInput>,
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

/// A concrete bookable interval on one calendar day. Slots that fall in the
/// past or collide with an occupying appointment are kept in the response
/// but flagged unavailable, so clients can render the full grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableSlot {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: i64,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicting_appointment: Option<Uuid>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Invalid availability window: {0}")]
    InvalidWindow(String),

    #[error("Availability windows overlap: {0}")]
    WindowOverlap(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl From<StorageError> for DoctorError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) => DoctorError::DoctorNotFound,
            StorageError::Unavailable(reason) => DoctorError::Unavailable(reason),
            other => DoctorError::ValidationError(other.to_string()),
        }
    }
}
