// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{DateTime, Timelike, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::SLOT_INTERVAL_MINUTES;
use shared_events::{EventPublisher, TransitionEvent};
use shared_models::appointment::{Appointment, AppointmentStatus};
use shared_models::auth::AuthUser;
use shared_storage::{AppointmentRepository, ProviderDirectory, StorageError};

use crate::models::{
    AppointmentError, BookAppointmentRequest, CancelAppointmentRequest, ListScope,
};
use crate::AppointmentCellState;

pub struct BookingService {
    appointments: Arc<dyn AppointmentRepository>,
    directory: Arc<dyn ProviderDirectory>,
    events: Arc<dyn EventPublisher>,
}

impl BookingService {
    pub fn new(state: &AppointmentCellState) -> Self {
        Self {
            appointments: state.appointments.clone(),
            directory: state.directory.clone(),
            events: state.events.clone(),
        }
    }

    /// Books a slot for a patient. The storage layer decides slot ownership
    /// atomically, so two racing requests for the same instant produce one
    /// appointment and one `SlotTaken`.
    pub async fn book_appointment(
        &self,
        requester: &AuthUser,
        request: BookAppointmentRequest,
        now: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        info!(
            "Booking appointment for patient {} with doctor {} at {}",
            request.patient_id, request.doctor_id, request.appointment_date
        );

        // **Step 1: Authorization**
        if requester.id != request.patient_id && !requester.is_admin() {
            return Err(AppointmentError::NotAllowed(
                "Patients can only book their own appointments".to_string(),
            ));
        }

        // **Step 2: Validation**
        self.validate_booking(&request, now).await?;

        // **Step 3: Claim the slot**
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: request.patient_id,
            doctor_id: request.doctor_id,
            appointment_date: request.appointment_date,
            duration_minutes: request.duration_minutes.unwrap_or(SLOT_INTERVAL_MINUTES as i32),
            appointment_type: request.appointment_type,
            status: AppointmentStatus::Scheduled,
            notes: request.notes,
            reminder_sent: false,
            created_at: now,
            updated_at: now,
        };

        let stored = self
            .appointments
            .create_if_slot_free(appointment)
            .await
            .map_err(|err| {
                if let StorageError::SlotTaken { .. } = err {
                    warn!(
                        "Slot {} for doctor {} was taken under us",
                        request.appointment_date, request.doctor_id
                    );
                }
                AppointmentError::from(err)
            })?;

        // **Step 4: Announce**
        self.events
            .publish(TransitionEvent::AppointmentScheduled {
                appointment_id: stored.id,
                patient_id: stored.patient_id,
                doctor_id: stored.doctor_id,
                appointment_date: stored.appointment_date,
                occurred_at: now,
            })
            .await;

        info!("Appointment {} scheduled", stored.id);
        Ok(stored)
    }

    async fn validate_booking(
        &self,
        request: &BookAppointmentRequest,
        now: DateTime<Utc>,
    ) -> Result<(), AppointmentError> {
        self.directory
            .get_doctor(request.doctor_id)
            .await?
            .ok_or(AppointmentError::DoctorNotFound)?;

        if request.appointment_date <= now {
            return Err(AppointmentError::ValidationError(
                "Appointment must be scheduled in the future".to_string(),
            ));
        }

        if !on_slot_grid(request.appointment_date) {
            return Err(AppointmentError::ValidationError(format!(
                "Appointment must start on a {}-minute boundary",
                SLOT_INTERVAL_MINUTES
            )));
        }

        if let Some(duration) = request.duration_minutes {
            if i64::from(duration) != SLOT_INTERVAL_MINUTES {
                return Err(AppointmentError::ValidationError(format!(
                    "Appointments are booked in {}-minute slots",
                    SLOT_INTERVAL_MINUTES
                )));
            }
        }

        Ok(())
    }

    pub async fn get_appointment(
        &self,
        requester: &AuthUser,
        appointment_id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self
            .appointments
            .get(appointment_id)
            .await?
            .ok_or(AppointmentError::AppointmentNotFound)?;

        if !appointment.is_participant(requester.id) && !requester.is_admin() {
            return Err(AppointmentError::NotAllowed(
                "Only participants can view this appointment".to_string(),
            ));
        }

        Ok(appointment)
    }

    /// Lists the requester's appointments.
    ///
    /// `Upcoming` keeps future appointments that still occupy their slot,
    /// soonest first. `Past` keeps everything else, most recent first.
    pub async fn list_appointments(
        &self,
        requester: &AuthUser,
        scope: Option<ListScope>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut appointments = self.appointments.list_involving(requester.id).await?;

        match scope {
            Some(ListScope::Upcoming) => {
                appointments.retain(|appointment| {
                    appointment.appointment_date >= now && appointment.status.occupies_slot()
                });
                appointments.sort_by_key(|appointment| appointment.appointment_date);
            }
            Some(ListScope::Past) => {
                appointments.retain(|appointment| {
                    appointment.appointment_date < now || !appointment.status.occupies_slot()
                });
                appointments.sort_by_key(|appointment| {
                    std::cmp::Reverse(appointment.appointment_date)
                });
            }
            None => {
                appointments.sort_by_key(|appointment| appointment.appointment_date);
            }
        }

        debug!(
            "Listed {} appointments for user {} (scope {:?})",
            appointments.len(),
            requester.id,
            scope
        );
        Ok(appointments)
    }

    /// Cancels an appointment that has not started yet. The slot opens up
    /// again as soon as the transition lands.
    pub async fn cancel_appointment(
        &self,
        requester: &AuthUser,
        appointment_id: Uuid,
        request: CancelAppointmentRequest,
        now: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self
            .appointments
            .get(appointment_id)
            .await?
            .ok_or(AppointmentError::AppointmentNotFound)?;

        if !appointment.is_participant(requester.id) && !requester.is_admin() {
            return Err(AppointmentError::NotAllowed(
                "Only participants can cancel this appointment".to_string(),
            ));
        }

        let cancelled = self
            .appointments
            .transition_status(
                appointment_id,
                &[AppointmentStatus::Scheduled, AppointmentStatus::Confirmed],
                AppointmentStatus::Cancelled,
                now,
            )
            .await
            .map_err(|err| match err {
                StorageError::AppointmentPrecondition { found, .. } => {
                    AppointmentError::InvalidTransition {
                        from: found,
                        to: AppointmentStatus::Cancelled,
                    }
                }
                other => AppointmentError::from(other),
            })?;

        self.events
            .publish(TransitionEvent::AppointmentCancelled {
                appointment_id: cancelled.id,
                cancelled_by: requester.id,
                occurred_at: now,
            })
            .await;

        info!(
            "Appointment {} cancelled by {} ({})",
            cancelled.id,
            requester.id,
            request.reason.as_deref().unwrap_or("no reason given")
        );
        Ok(cancelled)
    }

    /// Marks a missed appointment. Only the doctor side of the visit (or an
    /// admin) can make that call.
    pub async fn mark_no_show(
        &self,
        requester: &AuthUser,
        appointment_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self
            .appointments
            .get(appointment_id)
            .await?
            .ok_or(AppointmentError::AppointmentNotFound)?;

        if requester.id != appointment.doctor_id && !requester.is_admin() {
            return Err(AppointmentError::NotAllowed(
                "Only the doctor can mark a no-show".to_string(),
            ));
        }

        let marked = self
            .appointments
            .transition_status(
                appointment_id,
                &[AppointmentStatus::Scheduled, AppointmentStatus::Confirmed],
                AppointmentStatus::NoShow,
                now,
            )
            .await
            .map_err(|err| match err {
                StorageError::AppointmentPrecondition { found, .. } => {
                    AppointmentError::InvalidTransition {
                        from: found,
                        to: AppointmentStatus::NoShow,
                    }
                }
                other => AppointmentError::from(other),
            })?;

        self.events
            .publish(TransitionEvent::AppointmentNoShow {
                appointment_id: marked.id,
                occurred_at: now,
            })
            .await;

        info!("Appointment {} marked as no-show", marked.id);
        Ok(marked)
    }
}

fn on_slot_grid(at: DateTime<Utc>) -> bool {
    at.second() == 0
        && at.nanosecond() == 0
        && i64::from(at.minute()) % SLOT_INTERVAL_MINUTES == 0
}
