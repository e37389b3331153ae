use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use shared_models::appointment::{Appointment, AppointmentStatus};
use shared_models::payment::Payment;
use shared_models::provider::{AvailabilityWindow, Doctor};
use shared_models::session::VideoSession;

use crate::error::StorageError;

/// Persistence seam for appointments. Implementations own the uniqueness of
/// `(doctor_id, appointment_date)` among slot-occupying appointments and the
/// optimistic status guard; services never read-then-write around them.
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// Atomic conflict check-and-insert. Fails with `SlotTaken` when a
    /// slot-occupying appointment already holds the key.
    async fn create_if_slot_free(
        &self,
        appointment: Appointment,
    ) -> Result<Appointment, StorageError>;

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, StorageError>;

    /// Appointments for one doctor with `from <= appointment_date < until`,
    /// ordered by instant.
    async fn list_for_doctor_between(
        &self,
        doctor_id: Uuid,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, StorageError>;

    /// Appointments in which the user takes part, as patient or doctor,
    /// ordered by instant.
    async fn list_involving(&self, user_id: Uuid) -> Result<Vec<Appointment>, StorageError>;

    /// Guarded status write: succeeds only while the stored status is one of
    /// `expected`, otherwise fails with `AppointmentPrecondition` carrying
    /// the status actually found.
    async fn transition_status(
        &self,
        id: Uuid,
        expected: &[AppointmentStatus],
        next: AppointmentStatus,
        now: DateTime<Utc>,
    ) -> Result<Appointment, StorageError>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn record(&self, payment: Payment) -> Result<Payment, StorageError>;

    /// Payment attempts for an appointment, newest first.
    async fn list_for_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Vec<Payment>, StorageError>;

    async fn completed_payment_for(
        &self,
        appointment_id: Uuid,
    ) -> Result<Option<Payment>, StorageError>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Inserts a session, failing with `SessionExists` if the appointment
    /// already has a non-concluded one.
    async fn insert(&self, session: VideoSession) -> Result<VideoSession, StorageError>;

    async fn get(&self, id: Uuid) -> Result<Option<VideoSession>, StorageError>;

    async fn find_active_for_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Option<VideoSession>, StorageError>;

    /// Records the participant's join instant; the first join wins, repeats
    /// leave it unchanged.
    async fn mark_joined(
        &self,
        id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<VideoSession, StorageError>;

    /// Ends an active session: stamps `ended_at`, derives `duration_seconds`
    /// from `started_at`. Fails with `SessionPrecondition` when the session
    /// is not active.
    async fn conclude(
        &self,
        id: Uuid,
        ended_at: DateTime<Utc>,
    ) -> Result<VideoSession, StorageError>;
}

/// Read side of the provider-management collaborator, plus the management
/// writes used by the directory endpoints.
#[async_trait]
pub trait ProviderDirectory: Send + Sync {
    async fn register_doctor(&self, doctor: Doctor) -> Result<Doctor, StorageError>;

    async fn get_doctor(&self, id: Uuid) -> Result<Option<Doctor>, StorageError>;

    async fn availability_for(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<AvailabilityWindow>, StorageError>;

    /// Replaces the doctor's weekly window set. Fails with `NotFound` for a
    /// doctor absent from the directory.
    async fn replace_availability(
        &self,
        doctor_id: Uuid,
        windows: Vec<AvailabilityWindow>,
    ) -> Result<Vec<AvailabilityWindow>, StorageError>;
}
