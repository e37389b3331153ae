use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use tracing::debug;
use uuid::Uuid;

use shared_storage::{AppointmentRepository, ProviderDirectory};

use crate::models::{AvailableSlot, DoctorError};
use crate::DoctorCellState;

/// Minutes covered by one bookable slot. Booking validates requested times
/// against the same grid, so both sides move together.
pub const SLOT_INTERVAL_MINUTES: i64 = 30;

pub struct AvailabilityService {
    directory: Arc<dyn ProviderDirectory>,
    appointments: Arc<dyn AppointmentRepository>,
}

impl AvailabilityService {
    pub fn new(state: &DoctorCellState) -> Self {
        Self {
            directory: state.directory.clone(),
            appointments: state.appointments.clone(),
        }
    }

    /// Expands a doctor's recurring weekly windows into concrete slots for
    /// one calendar day.
    ///
    /// Every slot that fits inside a window is returned. A slot is marked
    /// unavailable when an appointment in an occupying status sits on its
    /// start instant, or when the slot does not start strictly after `now`.
    /// A trailing remainder shorter than the interval is dropped.
    pub async fn available_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<AvailableSlot>, DoctorError> {
        debug!("Calculating available slots for doctor {} on {}", doctor_id, date);

        self.directory
            .get_doctor(doctor_id)
            .await?
            .ok_or(DoctorError::DoctorNotFound)?;

        // Day of week (0 = Sunday, 1 = Monday, etc.)
        let day_of_week = match date.weekday() {
            Weekday::Sun => 0,
            Weekday::Mon => 1,
            Weekday::Tue => 2,
            Weekday::Wed => 3,
            Weekday::Thu => 4,
            Weekday::Fri => 5,
            Weekday::Sat => 6,
        };

        let mut windows: Vec<_> = self
            .directory
            .availability_for(doctor_id)
            .await?
            .into_iter()
            .filter(|window| window.is_enabled && window.day_of_week == day_of_week)
            .collect();
        if windows.is_empty() {
            debug!("Doctor {} has no enabled windows on {}", doctor_id, date);
            return Ok(Vec::new());
        }
        windows.sort_by_key(|window| window.start_time);

        // Appointments already sitting on this doctor's calendar that day.
        let day_start = date.and_time(NaiveTime::MIN).and_utc();
        let day_end = day_start + Duration::days(1);
        let occupied: Vec<(DateTime<Utc>, Uuid)> = self
            .appointments
            .list_for_doctor_between(doctor_id, day_start, day_end)
            .await?
            .into_iter()
            .filter(|appointment| appointment.status.occupies_slot())
            .map(|appointment| (appointment.appointment_date, appointment.id))
            .collect();

        let step = Duration::minutes(SLOT_INTERVAL_MINUTES);
        let mut slots = Vec::new();

        for window in &windows {
            let window_end = date.and_time(window.end_time).and_utc();
            let mut current = date.and_time(window.start_time).and_utc();

            while current + step <= window_end {
                let conflicting_appointment = occupied
                    .iter()
                    .find(|(taken_at, _)| *taken_at == current)
                    .map(|(_, id)| *id);
                let available = conflicting_appointment.is_none() && current > now;

                slots.push(AvailableSlot {
                    start_time: current,
                    end_time: current + step,
                    duration_minutes: SLOT_INTERVAL_MINUTES,
                    available,
                    conflicting_appointment,
                });

                current += step;
            }
        }

        debug!(
            "Doctor {} has {} slots on {} ({} bookable)",
            doctor_id,
            slots.len(),
            date,
            slots.iter().filter(|slot| slot.available).count()
        );
        Ok(slots)
    }
}
