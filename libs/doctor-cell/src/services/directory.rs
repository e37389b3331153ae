use std::sync::Arc;

use chrono::{DateTime, NaiveTime, Utc};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use shared_models::provider::{AvailabilityWindow, Doctor};
use shared_storage::ProviderDirectory;

use crate::models::{AvailabilityWindowInput, DoctorError, RegisterDoctorRequest, SetAvailabilityRequest};
use crate::DoctorCellState;

/// Directory operations: who the doctors are and when they work.
pub struct DirectoryService {
    directory: Arc<dyn ProviderDirectory>,
}

impl DirectoryService {
    pub fn new(state: &DoctorCellState) -> Self {
        Self {
            directory: state.directory.clone(),
        }
    }

    #[instrument(skip(self, request))]
    pub async fn register_doctor(
        &self,
        request: RegisterDoctorRequest,
        now: DateTime<Utc>,
    ) -> Result<Doctor, DoctorError> {
        if request.consultation_fee < 0.0 {
            return Err(DoctorError::ValidationError(
                "consultation_fee cannot be negative".to_string(),
            ));
        }

        let doctor = Doctor {
            id: request.id,
            specialty: request.specialty,
            consultation_fee: request.consultation_fee,
            currency: request.currency.unwrap_or_else(|| "USD".to_string()),
            is_verified: request.is_verified.unwrap_or(false),
            is_available: request.is_available.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        let stored = self.directory.register_doctor(doctor).await?;
        info!("Registered doctor {} ({:?})", stored.id, stored.specialty);
        Ok(stored)
    }

    pub async fn get_doctor(&self, doctor_id: Uuid) -> Result<Doctor, DoctorError> {
        self.directory
            .get_doctor(doctor_id)
            .await?
            .ok_or(DoctorError::DoctorNotFound)
    }

    pub async fn get_availability(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<AvailabilityWindow>, DoctorError> {
        self.get_doctor(doctor_id).await?;
        Ok(self.directory.availability_for(doctor_id).await?)
    }

    /// Replaces the doctor's whole weekly schedule. Every window is parsed
    /// and validated before anything is written, so a bad entry leaves the
    /// previous schedule untouched.
    #[instrument(skip(self, request))]
    pub async fn set_availability(
        &self,
        doctor_id: Uuid,
        request: SetAvailabilityRequest,
    ) -> Result<Vec<AvailabilityWindow>, DoctorError> {
        self.get_doctor(doctor_id).await?;

        let mut windows = Vec::with_capacity(request.windows.len());
        for input in &request.windows {
            windows.push(parse_window(doctor_id, input)?);
        }

        // Enabled windows on the same weekday must not overlap or slot
        // generation would emit the same instant twice.
        for (i, first) in windows.iter().enumerate() {
            for second in windows.iter().skip(i + 1) {
                if first.is_enabled && second.is_enabled && first.overlaps(second) {
                    return Err(DoctorError::WindowOverlap(format!(
                        "{} {}-{} collides with {}-{}",
                        weekday_name(first.day_of_week),
                        first.start_time,
                        first.end_time,
                        second.start_time,
                        second.end_time,
                    )));
                }
            }
        }

        debug!(
            "Replacing availability for doctor {} with {} windows",
            doctor_id,
            windows.len()
        );
        let stored = self.directory.replace_availability(doctor_id, windows).await?;
        info!(
            "Stored {} availability windows for doctor {}",
            stored.len(),
            doctor_id
        );
        Ok(stored)
    }
}

fn parse_window(
    doctor_id: Uuid,
    input: &AvailabilityWindowInput,
) -> Result<AvailabilityWindow, DoctorError> {
    if input.day_of_week > 6 {
        return Err(DoctorError::InvalidWindow(format!(
            "day_of_week {} is out of range (0 = Sunday .. 6 = Saturday)",
            input.day_of_week
        )));
    }

    let start_time = parse_clock(&input.start_time)?;
    let end_time = parse_clock(&input.end_time)?;
    if start_time >= end_time {
        return Err(DoctorError::InvalidWindow(format!(
            "window {}-{} does not end after it starts",
            input.start_time, input.end_time
        )));
    }

    Ok(AvailabilityWindow {
        id: Uuid::new_v4(),
        doctor_id,
        day_of_week: input.day_of_week,
        start_time,
        end_time,
        is_enabled: input.is_enabled.unwrap_or(true),
    })
}

fn parse_clock(raw: &str) -> Result<NaiveTime, DoctorError> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| DoctorError::InvalidWindow(format!("'{}' is not a valid HH:MM time", raw)))
}

fn weekday_name(day: u8) -> &'static str {
    match day {
        0 => "Sunday",
        1 => "Monday",
        2 => "Tuesday",
        3 => "Wednesday",
        4 => "Thursday",
        5 => "Friday",
        6 => "Saturday",
        _ => "unknown day",
    }
}
