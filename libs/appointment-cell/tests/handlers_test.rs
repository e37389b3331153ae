// libs/appointment-cell/tests/handlers_test.rs
//
// Handler-level coverage: error mapping onto the HTTP error type and the
// response envelopes.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use appointment_cell::handlers::{
    book_appointment, cancel_appointment, get_appointment, list_appointments, mark_no_show,
    ListQuery,
};
use appointment_cell::models::{BookAppointmentRequest, CancelAppointmentRequest};
use appointment_cell::AppointmentCellState;
use shared_events::BroadcastPublisher;
use shared_models::appointment::AppointmentType;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_models::provider::Doctor;
use shared_storage::MemoryStore;
use shared_utils::test_utils::{TestConfig, TestUser};

fn test_state() -> AppointmentCellState {
    let store = Arc::new(MemoryStore::new());
    AppointmentCellState {
        config: TestConfig::default().to_arc(),
        appointments: store.clone(),
        directory: store,
        events: Arc::new(BroadcastPublisher::new(16)),
    }
}

// Handlers read the wall clock, so appointments sit far in the future.
fn next_decade(hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 7, hour, min, 0).unwrap()
}

async fn seed_doctor(state: &AppointmentCellState) -> Uuid {
    let id = Uuid::new_v4();
    let now = Utc::now();
    state
        .directory
        .register_doctor(Doctor {
            id,
            specialty: Some("general".to_string()),
            consultation_fee: 60.0,
            currency: "USD".to_string(),
            is_verified: true,
            is_available: true,
            created_at: now,
            updated_at: now,
        })
        .await
        .expect("doctor should register");
    id
}

fn booking(patient_id: Uuid, doctor_id: Uuid, at: DateTime<Utc>) -> BookAppointmentRequest {
    BookAppointmentRequest {
        patient_id,
        doctor_id,
        appointment_date: at,
        appointment_type: AppointmentType::Virtual,
        duration_minutes: None,
        notes: Some("first visit".to_string()),
    }
}

fn user_ext(user: &AuthUser) -> Extension<AuthUser> {
    Extension(user.clone())
}

#[tokio::test]
async fn booking_for_someone_else_is_forbidden() {
    let state = test_state();
    let doctor_id = seed_doctor(&state).await;
    let user = TestUser::patient().to_auth_user();

    let result = book_appointment(
        State(state),
        user_ext(&user),
        Json(booking(Uuid::new_v4(), doctor_id, next_decade(9, 0))),
    )
    .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn slot_collision_maps_to_conflict() {
    let state = test_state();
    let doctor_id = seed_doctor(&state).await;
    let user = TestUser::patient().to_auth_user();

    let Json(body) = book_appointment(
        State(state.clone()),
        user_ext(&user),
        Json(booking(user.id, doctor_id, next_decade(9, 0))),
    )
    .await
    .unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["appointment"]["status"], "scheduled");

    let rival = TestUser::patient().to_auth_user();
    let result = book_appointment(
        State(state),
        user_ext(&rival),
        Json(booking(rival.id, doctor_id, next_decade(9, 0))),
    )
    .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn past_dates_map_to_validation_error() {
    let state = test_state();
    let doctor_id = seed_doctor(&state).await;
    let user = TestUser::patient().to_auth_user();

    let last_week = Utc::now() - Duration::days(7);
    // Snap to the grid so only the past check can fire.
    let last_week = last_week
        .date_naive()
        .and_hms_opt(9, 0, 0)
        .unwrap()
        .and_utc();

    let result = book_appointment(
        State(state),
        user_ext(&user),
        Json(booking(user.id, doctor_id, last_week)),
    )
    .await;
    assert!(matches!(result, Err(AppError::ValidationError(_))));
}

#[tokio::test]
async fn appointments_are_hidden_from_strangers() {
    let state = test_state();
    let doctor_id = seed_doctor(&state).await;
    let user = TestUser::patient().to_auth_user();

    let Json(body) = book_appointment(
        State(state.clone()),
        user_ext(&user),
        Json(booking(user.id, doctor_id, next_decade(9, 0))),
    )
    .await
    .unwrap();
    let id: Uuid = serde_json::from_value(body["appointment"]["id"].clone()).unwrap();

    let stranger = TestUser::patient().to_auth_user();
    let result = get_appointment(State(state.clone()), user_ext(&stranger), Path(id)).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    // The doctor side of the visit can see it.
    let doctor = TestUser::with_id(doctor_id, "doctor").to_auth_user();
    let Json(seen) = get_appointment(State(state), user_ext(&doctor), Path(id))
        .await
        .unwrap();
    assert_eq!(seen["appointment"]["id"], body["appointment"]["id"]);
}

#[tokio::test]
async fn unknown_appointment_maps_to_not_found() {
    let state = test_state();
    let user = TestUser::patient().to_auth_user();

    let result = get_appointment(State(state), user_ext(&user), Path(Uuid::new_v4())).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn double_cancel_maps_to_state_error() {
    let state = test_state();
    let doctor_id = seed_doctor(&state).await;
    let user = TestUser::patient().to_auth_user();

    let Json(body) = book_appointment(
        State(state.clone()),
        user_ext(&user),
        Json(booking(user.id, doctor_id, next_decade(9, 0))),
    )
    .await
    .unwrap();
    let id: Uuid = serde_json::from_value(body["appointment"]["id"].clone()).unwrap();

    let Json(cancelled) = cancel_appointment(
        State(state.clone()),
        user_ext(&user),
        Path(id),
        Json(CancelAppointmentRequest::default()),
    )
    .await
    .unwrap();
    assert_eq!(cancelled["appointment"]["status"], "cancelled");

    let result = cancel_appointment(
        State(state),
        user_ext(&user),
        Path(id),
        Json(CancelAppointmentRequest::default()),
    )
    .await;
    assert!(matches!(result, Err(AppError::State(_))));
}

#[tokio::test]
async fn no_show_handler_rejects_the_patient() {
    let state = test_state();
    let doctor_id = seed_doctor(&state).await;
    let user = TestUser::patient().to_auth_user();

    let Json(body) = book_appointment(
        State(state.clone()),
        user_ext(&user),
        Json(booking(user.id, doctor_id, next_decade(9, 0))),
    )
    .await
    .unwrap();
    let id: Uuid = serde_json::from_value(body["appointment"]["id"].clone()).unwrap();

    let result = mark_no_show(State(state.clone()), user_ext(&user), Path(id)).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    let doctor = TestUser::with_id(doctor_id, "doctor").to_auth_user();
    let Json(marked) = mark_no_show(State(state), user_ext(&doctor), Path(id))
        .await
        .unwrap();
    assert_eq!(marked["appointment"]["status"], "no_show");
}

#[tokio::test]
async fn list_handler_reports_counts() {
    let state = test_state();
    let doctor_id = seed_doctor(&state).await;
    let user = TestUser::patient().to_auth_user();

    for hour in [9, 10, 11] {
        book_appointment(
            State(state.clone()),
            user_ext(&user),
            Json(booking(user.id, doctor_id, next_decade(hour, 0))),
        )
        .await
        .unwrap();
    }

    let Json(body) = list_appointments(
        State(state),
        user_ext(&user),
        Query(ListQuery { scope: None }),
    )
    .await
    .unwrap();
    assert_eq!(body["count"], 3);
    assert_eq!(body["appointments"].as_array().unwrap().len(), 3);
}
