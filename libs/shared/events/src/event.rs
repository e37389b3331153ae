use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::payment::PaymentStatus;

/// Notification emitted after a state change has been persisted. Consumers
/// (reminder delivery, dashboards) subscribe to these instead of polling; the
/// scheduling core only promises publish-on-commit, not delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TransitionEvent {
    AppointmentScheduled {
        appointment_id: Uuid,
        patient_id: Uuid,
        doctor_id: Uuid,
        appointment_date: DateTime<Utc>,
        occurred_at: DateTime<Utc>,
    },
    AppointmentConfirmed {
        appointment_id: Uuid,
        occurred_at: DateTime<Utc>,
    },
    PaymentRecorded {
        appointment_id: Uuid,
        payment_id: Uuid,
        payment_status: PaymentStatus,
        occurred_at: DateTime<Utc>,
    },
    SessionStarted {
        appointment_id: Uuid,
        session_id: Uuid,
        occurred_at: DateTime<Utc>,
    },
    SessionJoined {
        session_id: Uuid,
        user_id: Uuid,
        occurred_at: DateTime<Utc>,
    },
    SessionEnded {
        appointment_id: Uuid,
        session_id: Uuid,
        duration_seconds: i64,
        occurred_at: DateTime<Utc>,
    },
    AppointmentCompleted {
        appointment_id: Uuid,
        occurred_at: DateTime<Utc>,
    },
    AppointmentCancelled {
        appointment_id: Uuid,
        cancelled_by: Uuid,
        occurred_at: DateTime<Utc>,
    },
    AppointmentNoShow {
        appointment_id: Uuid,
        occurred_at: DateTime<Utc>,
    },
}

impl TransitionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            TransitionEvent::AppointmentScheduled { .. } => "appointment_scheduled",
            TransitionEvent::AppointmentConfirmed { .. } => "appointment_confirmed",
            TransitionEvent::PaymentRecorded { .. } => "payment_recorded",
            TransitionEvent::SessionStarted { .. } => "session_started",
            TransitionEvent::SessionJoined { .. } => "session_joined",
            TransitionEvent::SessionEnded { .. } => "session_ended",
            TransitionEvent::AppointmentCompleted { .. } => "appointment_completed",
            TransitionEvent::AppointmentCancelled { .. } => "appointment_cancelled",
            TransitionEvent::AppointmentNoShow { .. } => "appointment_no_show",
        }
    }
}
