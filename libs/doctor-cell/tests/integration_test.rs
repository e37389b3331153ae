// libs/doctor-cell/tests/integration_test.rs
//
// Slot generation and schedule management against the in-memory store.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use doctor_cell::models::{AvailabilityWindowInput, RegisterDoctorRequest, SetAvailabilityRequest};
use doctor_cell::services::{availability::AvailabilityService, directory::DirectoryService};
use doctor_cell::{DoctorCellState, DoctorError};
use shared_models::appointment::{Appointment, AppointmentStatus, AppointmentType};
use shared_storage::MemoryStore;
use shared_utils::test_utils::TestConfig;

fn test_state() -> DoctorCellState {
    let store = Arc::new(MemoryStore::new());
    DoctorCellState {
        config: TestConfig::default().to_arc(),
        directory: store.clone(),
        appointments: store,
    }
}

// 2025-06-02 is a Monday
fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
}

fn monday_at(hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, hour, min, 0).unwrap()
}

fn day_before() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
}

fn window(day: u8, start: &str, end: &str) -> AvailabilityWindowInput {
    AvailabilityWindowInput {
        day_of_week: day,
        start_time: start.to_string(),
        end_time: end.to_string(),
        is_enabled: Some(true),
    }
}

fn appointment_at(doctor_id: Uuid, at: DateTime<Utc>) -> Appointment {
    Appointment {
        id: Uuid::new_v4(),
        patient_id: Uuid::new_v4(),
        doctor_id,
        appointment_date: at,
        duration_minutes: 30,
        appointment_type: AppointmentType::Virtual,
        status: AppointmentStatus::Scheduled,
        notes: None,
        reminder_sent: false,
        created_at: at - Duration::days(1),
        updated_at: at - Duration::days(1),
    }
}

async fn seed_doctor(state: &DoctorCellState) -> Uuid {
    let id = Uuid::new_v4();
    DirectoryService::new(state)
        .register_doctor(
            RegisterDoctorRequest {
                id,
                specialty: Some("cardiology".to_string()),
                consultation_fee: 120.0,
                currency: None,
                is_verified: Some(true),
                is_available: Some(true),
            },
            day_before(),
        )
        .await
        .expect("doctor should register");
    id
}

async fn set_windows(
    state: &DoctorCellState,
    doctor_id: Uuid,
    windows: Vec<AvailabilityWindowInput>,
) {
    DirectoryService::new(state)
        .set_availability(doctor_id, SetAvailabilityRequest { windows })
        .await
        .expect("schedule should store");
}

#[tokio::test]
async fn generates_half_hour_slots_within_a_window() {
    let state = test_state();
    let doctor_id = seed_doctor(&state).await;
    set_windows(&state, doctor_id, vec![window(1, "09:00", "12:00")]).await;

    let slots = AvailabilityService::new(&state)
        .available_slots(doctor_id, monday(), day_before())
        .await
        .unwrap();

    assert_eq!(slots.len(), 6);
    assert_eq!(slots[0].start_time, monday_at(9, 0));
    assert_eq!(slots[0].end_time, monday_at(9, 30));
    assert_eq!(slots[5].start_time, monday_at(11, 30));
    assert_eq!(slots[5].end_time, monday_at(12, 0));
    assert!(slots.iter().all(|slot| slot.available));
    assert!(slots.iter().all(|slot| slot.duration_minutes == 30));
}

#[tokio::test]
async fn concatenates_morning_and_afternoon_windows() {
    let state = test_state();
    let doctor_id = seed_doctor(&state).await;
    set_windows(
        &state,
        doctor_id,
        vec![window(1, "09:00", "11:00"), window(1, "13:00", "15:00")],
    )
    .await;

    let slots = AvailabilityService::new(&state)
        .available_slots(doctor_id, monday(), day_before())
        .await
        .unwrap();

    assert_eq!(slots.len(), 8);
    // Nothing is emitted for the lunch gap.
    assert!(slots
        .iter()
        .all(|slot| slot.start_time < monday_at(11, 0) || slot.start_time >= monday_at(13, 0)));
    assert_eq!(slots[4].start_time, monday_at(13, 0));
}

#[tokio::test]
async fn drops_trailing_remainder_shorter_than_interval() {
    let state = test_state();
    let doctor_id = seed_doctor(&state).await;
    set_windows(&state, doctor_id, vec![window(1, "09:00", "10:45")]).await;

    let slots = AvailabilityService::new(&state)
        .available_slots(doctor_id, monday(), day_before())
        .await
        .unwrap();

    assert_eq!(slots.len(), 3);
    assert_eq!(slots[2].start_time, monday_at(10, 0));
    assert_eq!(slots[2].end_time, monday_at(10, 30));
}

#[tokio::test]
async fn booked_slot_is_flagged_with_the_blocking_appointment() {
    let state = test_state();
    let doctor_id = seed_doctor(&state).await;
    set_windows(&state, doctor_id, vec![window(1, "09:00", "11:00")]).await;

    let booked = state
        .appointments
        .create_if_slot_free(appointment_at(doctor_id, monday_at(9, 30)))
        .await
        .unwrap();

    let slots = AvailabilityService::new(&state)
        .available_slots(doctor_id, monday(), day_before())
        .await
        .unwrap();

    let taken = slots
        .iter()
        .find(|slot| slot.start_time == monday_at(9, 30))
        .unwrap();
    assert!(!taken.available);
    assert_eq!(taken.conflicting_appointment, Some(booked.id));

    let free = slots
        .iter()
        .find(|slot| slot.start_time == monday_at(10, 0))
        .unwrap();
    assert!(free.available);
    assert_eq!(free.conflicting_appointment, None);
}

#[tokio::test]
async fn cancelled_appointment_frees_its_slot() {
    let state = test_state();
    let doctor_id = seed_doctor(&state).await;
    set_windows(&state, doctor_id, vec![window(1, "09:00", "11:00")]).await;

    let booked = state
        .appointments
        .create_if_slot_free(appointment_at(doctor_id, monday_at(9, 30)))
        .await
        .unwrap();
    state
        .appointments
        .transition_status(
            booked.id,
            &[AppointmentStatus::Scheduled],
            AppointmentStatus::Cancelled,
            day_before(),
        )
        .await
        .unwrap();

    let slots = AvailabilityService::new(&state)
        .available_slots(doctor_id, monday(), day_before())
        .await
        .unwrap();

    let freed = slots
        .iter()
        .find(|slot| slot.start_time == monday_at(9, 30))
        .unwrap();
    assert!(freed.available);
    assert_eq!(freed.conflicting_appointment, None);
}

#[tokio::test]
async fn slots_not_strictly_in_the_future_are_unavailable() {
    let state = test_state();
    let doctor_id = seed_doctor(&state).await;
    set_windows(&state, doctor_id, vec![window(1, "09:00", "12:00")]).await;

    // Asking mid-morning: 09:00, 09:30 and the 10:00 boundary itself have
    // already passed.
    let slots = AvailabilityService::new(&state)
        .available_slots(doctor_id, monday(), monday_at(10, 0))
        .await
        .unwrap();

    for slot in &slots {
        if slot.start_time <= monday_at(10, 0) {
            assert!(!slot.available, "slot {} should be stale", slot.start_time);
        } else {
            assert!(slot.available, "slot {} should be open", slot.start_time);
        }
    }
}

#[tokio::test]
async fn day_without_windows_yields_no_slots() {
    let state = test_state();
    let doctor_id = seed_doctor(&state).await;
    // Tuesday schedule only.
    set_windows(&state, doctor_id, vec![window(2, "09:00", "12:00")]).await;

    let slots = AvailabilityService::new(&state)
        .available_slots(doctor_id, monday(), day_before())
        .await
        .unwrap();
    assert!(slots.is_empty());
}

#[tokio::test]
async fn disabled_windows_are_ignored() {
    let state = test_state();
    let doctor_id = seed_doctor(&state).await;
    set_windows(
        &state,
        doctor_id,
        vec![AvailabilityWindowInput {
            day_of_week: 1,
            start_time: "09:00".to_string(),
            end_time: "12:00".to_string(),
            is_enabled: Some(false),
        }],
    )
    .await;

    let slots = AvailabilityService::new(&state)
        .available_slots(doctor_id, monday(), day_before())
        .await
        .unwrap();
    assert!(slots.is_empty());
}

#[tokio::test]
async fn unknown_doctor_is_rejected() {
    let state = test_state();

    let err = AvailabilityService::new(&state)
        .available_slots(Uuid::new_v4(), monday(), day_before())
        .await
        .unwrap_err();
    assert!(matches!(err, DoctorError::DoctorNotFound));
}

#[tokio::test]
async fn overlapping_enabled_windows_are_rejected() {
    let state = test_state();
    let doctor_id = seed_doctor(&state).await;

    let err = DirectoryService::new(&state)
        .set_availability(
            doctor_id,
            SetAvailabilityRequest {
                windows: vec![window(1, "09:00", "12:00"), window(1, "11:00", "14:00")],
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DoctorError::WindowOverlap(_)));
}

#[tokio::test]
async fn failed_replacement_leaves_previous_schedule_in_place() {
    let state = test_state();
    let doctor_id = seed_doctor(&state).await;
    set_windows(&state, doctor_id, vec![window(1, "09:00", "12:00")]).await;

    let err = DirectoryService::new(&state)
        .set_availability(
            doctor_id,
            SetAvailabilityRequest {
                windows: vec![window(1, "14:00", "09:00")],
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DoctorError::InvalidWindow(_)));

    let kept = DirectoryService::new(&state)
        .get_availability(doctor_id)
        .await
        .unwrap();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].day_of_week, 1);
}
