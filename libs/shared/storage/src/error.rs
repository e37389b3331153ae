use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use shared_models::appointment::AppointmentStatus;
use shared_models::session::SessionStatus;

/// Typed outcomes of the persistence layer. Business rejections
/// (`SlotTaken`, the precondition variants) are distinct from `Unavailable`,
/// which means the write's outcome is unknown and must never be treated as
/// success.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StorageError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("slot already taken for doctor {doctor_id} at {appointment_date}")]
    SlotTaken {
        doctor_id: Uuid,
        appointment_date: DateTime<Utc>,
    },

    #[error("appointment {id} is {found}, expected one of {expected:?}")]
    AppointmentPrecondition {
        id: Uuid,
        expected: Vec<AppointmentStatus>,
        found: AppointmentStatus,
    },

    #[error("session {id} is {found}")]
    SessionPrecondition { id: Uuid, found: SessionStatus },

    #[error("an active session already exists for appointment {0}")]
    SessionExists(Uuid),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
