// libs/video-session-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::appointment::AppointmentStatus;
use shared_models::session::SessionStatus;
use shared_storage::StorageError;

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Error)]
pub enum SessionError {
    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Appointment is in person; video sessions are for virtual visits")]
    NotVirtual,

    #[error("Session opens at {earliest}")]
    TooEarly { earliest: DateTime<Utc> },

    #[error("Appointment is {status}; the session cannot start")]
    InvalidAppointmentState { status: AppointmentStatus },

    #[error("Session already {status}")]
    SessionConcluded { status: SessionStatus },

    #[error("Session state changed underneath the request")]
    Contested,

    #[error("Not allowed: {0}")]
    NotAllowed(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl From<StorageError> for SessionError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) => SessionError::SessionNotFound,
            StorageError::SessionExists(_) => SessionError::Contested,
            StorageError::SessionPrecondition { found, .. } => {
                SessionError::SessionConcluded { status: found }
            }
            StorageError::Unavailable(reason) => SessionError::Unavailable(reason),
            other => SessionError::ValidationError(other.to_string()),
        }
    }
}
