use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use shared_models::appointment::{Appointment, AppointmentStatus};
use shared_models::payment::{Payment, PaymentStatus};
use shared_models::provider::{AvailabilityWindow, Doctor};
use shared_models::session::{SessionStatus, VideoSession};

use crate::error::StorageError;
use crate::repository::{
    AppointmentRepository, PaymentRepository, ProviderDirectory, SessionRepository,
};

/// Process-local store backing all repositories. One mutex spans every
/// table, which makes `create_if_slot_free` and the guarded status writes
/// single critical sections. Critical sections never await.
pub struct MemoryStore {
    inner: Mutex<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    doctors: HashMap<Uuid, Doctor>,
    availability: HashMap<Uuid, Vec<AvailabilityWindow>>,
    appointments: HashMap<Uuid, Appointment>,
    payments: HashMap<Uuid, Payment>,
    sessions: HashMap<Uuid, VideoSession>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner::default()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreInner>, StorageError> {
        self.inner
            .lock()
            .map_err(|_| StorageError::Unavailable("store lock poisoned".to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AppointmentRepository for MemoryStore {
    async fn create_if_slot_free(
        &self,
        appointment: Appointment,
    ) -> Result<Appointment, StorageError> {
        let mut inner = self.lock()?;

        let occupied = inner.appointments.values().any(|existing| {
            existing.doctor_id == appointment.doctor_id
                && existing.appointment_date == appointment.appointment_date
                && existing.status.occupies_slot()
        });
        if occupied {
            return Err(StorageError::SlotTaken {
                doctor_id: appointment.doctor_id,
                appointment_date: appointment.appointment_date,
            });
        }

        debug!(
            "Inserting appointment {} for doctor {} at {}",
            appointment.id, appointment.doctor_id, appointment.appointment_date
        );
        inner.appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, StorageError> {
        let inner = self.lock()?;
        Ok(inner.appointments.get(&id).cloned())
    }

    async fn list_for_doctor_between(
        &self,
        doctor_id: Uuid,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, StorageError> {
        let inner = self.lock()?;
        let mut matching: Vec<Appointment> = inner
            .appointments
            .values()
            .filter(|a| {
                a.doctor_id == doctor_id
                    && a.appointment_date >= from
                    && a.appointment_date < until
            })
            .cloned()
            .collect();
        matching.sort_by_key(|a| a.appointment_date);
        Ok(matching)
    }

    async fn list_involving(&self, user_id: Uuid) -> Result<Vec<Appointment>, StorageError> {
        let inner = self.lock()?;
        let mut matching: Vec<Appointment> = inner
            .appointments
            .values()
            .filter(|a| a.is_participant(user_id))
            .cloned()
            .collect();
        matching.sort_by_key(|a| a.appointment_date);
        Ok(matching)
    }

    async fn transition_status(
        &self,
        id: Uuid,
        expected: &[AppointmentStatus],
        next: AppointmentStatus,
        now: DateTime<Utc>,
    ) -> Result<Appointment, StorageError> {
        let mut inner = self.lock()?;
        let appointment = inner
            .appointments
            .get_mut(&id)
            .ok_or_else(|| StorageError::NotFound(format!("appointment {}", id)))?;

        if !expected.contains(&appointment.status) {
            return Err(StorageError::AppointmentPrecondition {
                id,
                expected: expected.to_vec(),
                found: appointment.status,
            });
        }

        debug!(
            "Appointment {} status {} -> {}",
            id, appointment.status, next
        );
        appointment.status = next;
        appointment.updated_at = now;
        Ok(appointment.clone())
    }
}

#[async_trait]
impl PaymentRepository for MemoryStore {
    async fn record(&self, payment: Payment) -> Result<Payment, StorageError> {
        let mut inner = self.lock()?;
        debug!(
            "Recording {} payment {} for appointment {}",
            payment.payment_status, payment.id, payment.appointment_id
        );
        inner.payments.insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn list_for_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Vec<Payment>, StorageError> {
        let inner = self.lock()?;
        let mut matching: Vec<Payment> = inner
            .payments
            .values()
            .filter(|p| p.appointment_id == appointment_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn completed_payment_for(
        &self,
        appointment_id: Uuid,
    ) -> Result<Option<Payment>, StorageError> {
        let inner = self.lock()?;
        Ok(inner
            .payments
            .values()
            .find(|p| {
                p.appointment_id == appointment_id
                    && p.payment_status == PaymentStatus::Completed
            })
            .cloned())
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn insert(&self, session: VideoSession) -> Result<VideoSession, StorageError> {
        let mut inner = self.lock()?;

        let already_open = inner
            .sessions
            .values()
            .any(|s| s.appointment_id == session.appointment_id && !s.status.is_concluded());
        if already_open {
            return Err(StorageError::SessionExists(session.appointment_id));
        }

        debug!(
            "Inserting session {} for appointment {}",
            session.id, session.appointment_id
        );
        inner.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn get(&self, id: Uuid) -> Result<Option<VideoSession>, StorageError> {
        let inner = self.lock()?;
        Ok(inner.sessions.get(&id).cloned())
    }

    async fn find_active_for_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Option<VideoSession>, StorageError> {
        let inner = self.lock()?;
        Ok(inner
            .sessions
            .values()
            .find(|s| s.appointment_id == appointment_id && !s.status.is_concluded())
            .cloned())
    }

    async fn mark_joined(
        &self,
        id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<VideoSession, StorageError> {
        let mut inner = self.lock()?;
        let session = inner
            .sessions
            .get_mut(&id)
            .ok_or_else(|| StorageError::NotFound(format!("session {}", id)))?;

        if session.status != SessionStatus::Active {
            return Err(StorageError::SessionPrecondition {
                id,
                found: session.status,
            });
        }

        let participant = session
            .participants
            .iter_mut()
            .find(|p| p.user_id == user_id)
            .ok_or_else(|| {
                StorageError::NotFound(format!("participant {} in session {}", user_id, id))
            })?;

        if participant.joined_at.is_none() {
            participant.joined_at = Some(now);
            session.updated_at = now;
        }
        Ok(session.clone())
    }

    async fn conclude(
        &self,
        id: Uuid,
        ended_at: DateTime<Utc>,
    ) -> Result<VideoSession, StorageError> {
        let mut inner = self.lock()?;
        let session = inner
            .sessions
            .get_mut(&id)
            .ok_or_else(|| StorageError::NotFound(format!("session {}", id)))?;

        if session.status != SessionStatus::Active {
            return Err(StorageError::SessionPrecondition {
                id,
                found: session.status,
            });
        }

        session.status = SessionStatus::Ended;
        session.ended_at = Some(ended_at);
        session.duration_seconds = Some(
            session
                .started_at
                .map_or(0, |started| (ended_at - started).num_seconds().max(0)),
        );
        session.updated_at = ended_at;
        debug!("Session {} ended after {:?}s", id, session.duration_seconds);
        Ok(session.clone())
    }
}

#[async_trait]
impl ProviderDirectory for MemoryStore {
    async fn register_doctor(&self, doctor: Doctor) -> Result<Doctor, StorageError> {
        let mut inner = self.lock()?;
        debug!("Registering doctor {}", doctor.id);
        inner.doctors.insert(doctor.id, doctor.clone());
        Ok(doctor)
    }

    async fn get_doctor(&self, id: Uuid) -> Result<Option<Doctor>, StorageError> {
        let inner = self.lock()?;
        Ok(inner.doctors.get(&id).cloned())
    }

    async fn availability_for(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<AvailabilityWindow>, StorageError> {
        let inner = self.lock()?;
        Ok(inner.availability.get(&doctor_id).cloned().unwrap_or_default())
    }

    async fn replace_availability(
        &self,
        doctor_id: Uuid,
        windows: Vec<AvailabilityWindow>,
    ) -> Result<Vec<AvailabilityWindow>, StorageError> {
        let mut inner = self.lock()?;
        if !inner.doctors.contains_key(&doctor_id) {
            return Err(StorageError::NotFound(format!("doctor {}", doctor_id)));
        }
        inner.availability.insert(doctor_id, windows.clone());
        Ok(windows)
    }
}
